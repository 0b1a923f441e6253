//! # Pointcut Module
//!
//! Parsing and evaluation of pointcut expressions.
//!
//! An expression such as
//!
//! ```text
//! method(public Acme::Blog::.*Repository->add()) && !setting(Acme.Blog.readOnly)
//! ```
//!
//! is split into operands at top-level `&&` / `||`, turned into a [`FilterComposite`] by the
//! [`PointcutExpressionParser`] and evaluated against a [`Subject`] (a class and optionally one
//! of its methods) through a [`MatchContext`].
//!
//! ## Evaluation
//!
//! Composites are folded left to right without precedence, starting from `true`. Final classes
//! and final methods never match. References to named pointcuts (`Aspect->name`) are resolved
//! lazily through a [`PointcutLookup`]; a reference chain that returns to itself fails with
//! [`AopError::CircularPointcutReference`](crate::AopError::CircularPointcutReference).
//!
//! ## Class-name reduction
//!
//! Every filter can narrow a [`ClassNameIndex`] to the classes it could possibly match. The
//! weaver uses this to skip aspects that cannot apply to a class.

mod class_index;
mod composite;
mod definition;
mod filter;
mod lexer;
mod parser;
mod pattern;

pub use class_index::ClassNameIndex;
pub use composite::{FilterComposite, Matcher, Operator};
pub use definition::Pointcut;
pub use filter::{
    CustomFilter, Filter, FilterResolver, MatchContext, NoPointcuts, PointcutFilter,
    PointcutLookup, PointcutReference, SettingCondition, Subject,
};
pub(crate) use parser::expression_text;
pub use parser::PointcutExpressionParser;
pub use pattern::NamePattern;
