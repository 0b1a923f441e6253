//! # aopweave
//!
//! **aopweave** matches pointcut expressions against a static class model and builds interceptors
//! that run aspect advice around the methods they select.
//!
//! ## Overview
//!
//! Aspects are classes tagged `aspect` in a class manifest. Their methods declare advice
//! (`before`, `around`, `afterReturning`, `afterThrowing`, `after`) or named pointcuts, and their
//! class-level introductions add interfaces to other classes. At bootstrap the weaver parses every
//! pointcut, matches it against every target class and method, and produces an immutable
//! [`WeaverContext`]. A [`ProxyFactory`] turns that context into dispatch tables and hands out
//! [`ProxyObject`]s whose calls run through the matched advice.
//!
//! ## Architecture
//!
//! - **[`reflection`]** - Class manifest model and the [`ClassRegistry`] queried by filters
//! - **[`pointcut`]** - Expression lexer and parser, filters and the filter composite
//! - **[`aspect`]** - Advice, advisors, introductions and the [`AspectRegistry`]
//! - **[`weaver`]** - Weave-time matching, intercepted methods maps and proxy planning
//! - **[`runtime`]** - Join points, advice chains, interception tables and proxy objects
//! - **[`generator`]** - Rust source generation for proxy modules
//! - **[`settings`]** - Application settings consulted by `setting(...)` pointcuts
//! - **[`config`]** - Weaver configuration with environment overrides
//! - **[`telemetry`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `aopweave` command line
//!
//! ### Weaving Flow
//!
//! ```text
//! manifest ─► ClassRegistry ─► AspectRegistry ─► Weaver::weave ─► WeaverContext
//!                                  (pointcuts parsed)     │
//!                                                         ├─► ProxyFactory ─► ProxyObject::call
//!                                                         └─► generator::write_proxy_modules
//! ```
//!
//! ## Pointcut Expressions
//!
//! ```text
//! method(public Acme::Blog::.*Repository->(add|remove)())
//! classTaggedWith(entity) && !within(Acme::Internal::.*)
//! setting(features.audit) || Acme::Blog::LoggingAspect->repositories
//! filter(AdminOnlyFilter)
//! ```
//!
//! Operators are evaluated strictly left to right without precedence; group with
//! `method(...)` or a named pointcut where a different order is needed.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aopweave::{arguments, ObjectRegistry, ProxyFactory, Settings, Weaver, WeaverConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let classes = aopweave::reflection::load_manifest("classes.yaml")?;
//!
//! let mut objects = ObjectRegistry::new();
//! objects.register_advice("Acme::Blog::LoggingAspect", "log_calls", |jp| {
//!     tracing::info!(method = jp.method_name(), "calling");
//!     jp.proceed()
//! });
//! objects.register_body("Acme::Blog::PostRepository", "add", |_, args| Ok(json!(args.len())));
//!
//! let context = Weaver::new(WeaverConfig::from_env())
//!     .weave(classes, Settings::default(), &objects)?;
//! let factory = ProxyFactory::new(context, Arc::new(objects))?;
//!
//! let posts = factory.instantiate("Acme::Blog::PostRepository", Default::default())?;
//! posts.call("add", arguments([("title", json!("Hello"))]))?;
//! ```
//!
//! ## Errors
//!
//! Everything that can go wrong while weaving is an [`AopError`] and aborts the weave; nothing
//! is partially built. Failures raised while calling methods are [`InvocationError`] values.

pub mod aspect;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod pointcut;
pub mod reflection;
pub mod runtime;
pub mod settings;
pub mod telemetry;
pub mod weaver;

pub use aspect::{Advice, AdviceKind, AspectRegistry};
pub use config::WeaverConfig;
pub use error::AopError;
pub use pointcut::{FilterComposite, PointcutExpressionParser, PointcutFilter};
pub use reflection::ClassRegistry;
pub use runtime::{
    arguments, ArgVec, InvocationError, InvocationResult, JoinPoint, ObjectRegistry,
    ProxyFactory, ProxyObject,
};
pub use settings::Settings;
pub use weaver::{Weaver, WeaverContext};
