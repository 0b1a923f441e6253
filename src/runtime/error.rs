use std::fmt;

/// Failure raised by a method body or an advice at run time
///
/// Plays the role of an exception: it carries a class (an error kind such as
/// `InvalidArgument`) and a message, can be cloned into the join point for after-throwing
/// advice, and is compared by value in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationError {
    pub class: String,
    pub message: String,
}

impl InvocationError {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        InvocationError {
            class: class.into(),
            message: message.into(),
        }
    }

    pub(crate) fn undefined_method(class_name: &str, method: &str) -> Self {
        InvocationError::new(
            "UndefinedMethod",
            format!("{}::{} does not exist", class_name, method),
        )
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)
    }
}

impl std::error::Error for InvocationError {}
