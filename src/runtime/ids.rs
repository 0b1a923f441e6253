use std::fmt::{Display, Formatter};

/// Identity of a proxy object, backed by ULID
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct ObjectId(pub ulid::Ulid);

impl ObjectId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
