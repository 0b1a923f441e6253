use std::collections::BTreeSet;

/// Sorted set of candidate class names
///
/// Filters narrow an index down to the classes they could possibly match, which lets the weaver
/// skip aspect containers that cannot apply to a class before running the full matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNameIndex {
    names: BTreeSet<String>,
}

impl ClassNameIndex {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClassNameIndex {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn intersect(&self, other: &ClassNameIndex) -> ClassNameIndex {
        ClassNameIndex {
            names: self.names.intersection(&other.names).cloned().collect(),
        }
    }

    pub fn union(&self, other: &ClassNameIndex) -> ClassNameIndex {
        ClassNameIndex {
            names: self.names.union(&other.names).cloned().collect(),
        }
    }

    /// Keep only names accepted by `keep`
    pub fn filter<F>(&self, mut keep: F) -> ClassNameIndex
    where
        F: FnMut(&str) -> bool,
    {
        ClassNameIndex {
            names: self.names.iter().filter(|n| keep(n)).cloned().collect(),
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ClassNameIndex {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        ClassNameIndex::new(iter)
    }
}
