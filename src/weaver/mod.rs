//! # Weaver Module
//!
//! Weave-time matching of aspects against target classes and planning of the proxies that
//! carry the result.
//!
//! ## Process
//!
//! 1. Build the [`AspectRegistry`](crate::aspect::AspectRegistry), parsing every expression
//! 2. Collect target classes: everything that is neither an aspect nor in an excluded namespace
//! 3. Narrow each aspect's candidate classes by class-name reduction
//! 4. Per target class, match introductions (class level) and advisors (per method) into a
//!    [`ClassInterception`]
//! 5. Plan a [`ProxySpec`] for every class with advice or introduced interfaces
//!
//! The outcome is frozen into an immutable [`WeaverContext`]. Matching is deterministic: aspects
//! and targets are processed in sorted order, advice within an aspect in declaration order.

mod builder;
mod context;
mod intercepted;
mod naming;

pub use builder::{MethodPlan, MethodSpec, ProxySpec};
pub use context::{Weaver, WeaverContext};
pub use intercepted::{
    ClassInterception, GroupedAdvices, InterceptedMethod, IntroducedInterface, MethodOrigin,
    is_lifecycle_method, CONSTRUCTOR, POST_DESERIALIZE,
};
pub use naming::ProxyNamer;
