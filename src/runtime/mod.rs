//! # Runtime Module
//!
//! Join points, advice chains and the dispatch of calls on woven objects.
//!
//! ## Invocation
//!
//! A call on a [`ProxyObject`] looks up the method in the class's [`InterceptionTable`].
//! Methods without advice call their body directly. Advised methods run through the
//! interceptor:
//!
//! ```text
//! before* -> around* / body -> afterReturning* -> after*
//!     \________________ on error _______________/
//!                        |
//!                 afterThrowing* -> after* (unless already run) -> error
//! ```
//!
//! Every call gets its own [`JoinPoint`] and [`AdviceChain`], so recursive and concurrent calls
//! share no state.
//!
//! ## Wiring
//!
//! Advice handlers, introduced default implementations and original bodies are looked up in an
//! [`ObjectRegistry`]. The [`ProxyFactory`] resolves all of them once per weave.

mod chain;
mod error;
mod ids;
mod interceptor;
mod join_point;
mod objects;
mod proxy;

use std::sync::Arc;

use serde_json::Value;
use smallvec::SmallVec;

pub use chain::{AdviceChain, AdviceHandler};
pub use error::InvocationError;
pub use ids::ObjectId;
pub use interceptor::InterceptionTable;
pub use join_point::JoinPoint;
pub use objects::{MethodBody, ObjectRegistry};
pub use proxy::{ProxyFactory, ProxyObject};

/// Maximum number of arguments stored inline
pub const MAX_INLINE_ARGS: usize = 8;

/// Named call arguments in declaration order
pub type ArgVec = SmallVec<[(Arc<str>, Value); MAX_INLINE_ARGS]>;

/// Outcome of a call, a body or an advice
pub type InvocationResult<T = Value> = std::result::Result<T, InvocationError>;

/// Build an [`ArgVec`] from name/value pairs
pub fn arguments<I, K>(pairs: I) -> ArgVec
where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (Arc::from(name.as_ref()), value))
        .collect()
}

#[cfg(test)]
mod tests;
