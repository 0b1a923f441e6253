//! Aspect registry: advice, named pointcuts and introductions declared by aspect classes.
//!
//! Aspect classes are recognised by a tag in the class manifest (`aspect` by default). Each one
//! becomes an [`AspectContainer`]; containers are kept in class-name order and, within a
//! container, in declaration order. That order is the order in which matched advice runs.

mod model;
mod registry;

pub use model::{Advice, AdviceKind, Advisor, AspectContainer, Introduction};
pub use registry::AspectRegistry;
