use std::fmt;

use super::class_index::ClassNameIndex;
use super::composite::FilterComposite;
use super::filter::{MatchContext, Subject};
use crate::error::Result;

/// A parsed pointcut expression
///
/// Named pointcuts can be referenced from other expressions as `AspectClass->name`; advice and
/// introductions carry anonymous ones.
#[derive(Debug, Clone)]
pub struct Pointcut {
    name: Option<String>,
    aspect_class: String,
    expression: String,
    composite: FilterComposite,
}

impl Pointcut {
    pub fn new(
        name: Option<String>,
        aspect_class: impl Into<String>,
        expression: impl Into<String>,
        composite: FilterComposite,
    ) -> Self {
        Pointcut {
            name,
            aspect_class: aspect_class.into(),
            expression: expression.into(),
            composite,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn aspect_class(&self) -> &str {
        &self.aspect_class
    }

    /// The expression as written
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn composite(&self) -> &FilterComposite {
        &self.composite
    }

    pub(crate) fn composite_mut(&mut self) -> &mut FilterComposite {
        &mut self.composite
    }

    pub fn matches(&self, ctx: &MatchContext<'_>, subject: &Subject<'_>) -> Result<bool> {
        self.composite.matches(ctx, subject)
    }

    pub fn reduce_target_class_names(
        &self,
        ctx: &MatchContext<'_>,
        index: &ClassNameIndex,
    ) -> Result<ClassNameIndex> {
        self.composite.reduce_target_class_names(ctx, index)
    }
}

impl fmt::Display for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}->{}: {}", self.aspect_class, name, self.composite),
            None => self.composite.fmt(f),
        }
    }
}
