use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::class_index::ClassNameIndex;
use super::definition::Pointcut;
use super::pattern::NamePattern;
use crate::error::{AopError, Result};
use crate::reflection::{ClassInfo, ClassRegistry, MethodInfo, Visibility};
use crate::settings::Settings;

/// What a filter is asked about: a class, and for method-level matching one of its methods
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub class: &'a ClassInfo,
    /// `None` for class-level matching (introductions); method filters then match anything
    pub method: Option<&'a MethodInfo>,
    /// Class (or introduced interface) that declares `method`
    pub declaring_class: Option<&'a str>,
}

impl<'a> Subject<'a> {
    pub fn method(class: &'a ClassInfo, method: &'a MethodInfo, declaring_class: &'a str) -> Self {
        Subject {
            class,
            method: Some(method),
            declaring_class: Some(declaring_class),
        }
    }

    pub fn class_level(class: &'a ClassInfo) -> Self {
        Subject {
            class,
            method: None,
            declaring_class: None,
        }
    }

    pub fn is_class_level(&self) -> bool {
        self.method.is_none()
    }
}

/// Source of named pointcuts for reference resolution
pub trait PointcutLookup {
    fn find_pointcut(&self, aspect_class: &str, name: &str) -> Option<&Pointcut>;
}

/// Lookup that knows no pointcuts, for matching outside of an aspect registry
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPointcuts;

impl PointcutLookup for NoPointcuts {
    fn find_pointcut(&self, _aspect_class: &str, _name: &str) -> Option<&Pointcut> {
        None
    }
}

/// Everything a single match attempt may consult
///
/// A context belongs to one attempt (one `call_id`). It carries the stack of pointcut
/// references currently being resolved, so a reference that leads back to itself is reported
/// instead of recursing forever.
pub struct MatchContext<'a> {
    classes: &'a ClassRegistry,
    settings: &'a Settings,
    pointcuts: &'a dyn PointcutLookup,
    call_id: u64,
    visiting: RefCell<Vec<String>>,
}

impl<'a> MatchContext<'a> {
    pub fn new(
        classes: &'a ClassRegistry,
        settings: &'a Settings,
        pointcuts: &'a dyn PointcutLookup,
        call_id: u64,
    ) -> Self {
        MatchContext {
            classes,
            settings,
            pointcuts,
            call_id,
            visiting: RefCell::new(Vec::new()),
        }
    }

    pub fn classes(&self) -> &'a ClassRegistry {
        self.classes
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Identifier of this match attempt
    pub fn call_id(&self) -> u64 {
        self.call_id
    }

    /// Resolve `aspect_class->name`
    ///
    /// # Errors
    ///
    /// [`AopError::UnknownPointcut`] if no such pointcut is registered.
    pub fn find_pointcut(&self, aspect_class: &str, name: &str) -> Result<&'a Pointcut> {
        self.pointcuts
            .find_pointcut(aspect_class, name)
            .ok_or_else(|| AopError::UnknownPointcut {
                aspect: aspect_class.to_string(),
                pointcut: name.to_string(),
            })
    }

    fn enter(&self, id: String) -> Result<VisitGuard<'_>> {
        let mut stack = self.visiting.borrow_mut();
        if stack.contains(&id) {
            let mut chain = stack.clone();
            chain.push(id);
            return Err(AopError::CircularPointcutReference { chain });
        }
        stack.push(id);
        Ok(VisitGuard {
            stack: &self.visiting,
        })
    }
}

impl fmt::Debug for MatchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchContext")
            .field("call_id", &self.call_id)
            .field("visiting", &self.visiting.borrow())
            .finish()
    }
}

struct VisitGuard<'c> {
    stack: &'c RefCell<Vec<String>>,
}

impl Drop for VisitGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// User-provided filter behind `filter(Name)`
///
/// Implementations are registered with the object registry under the name used in the
/// expression. Plain closures taking `(&MatchContext, &Subject)` implement this trait too.
pub trait PointcutFilter: Send + Sync {
    fn matches(&self, ctx: &MatchContext<'_>, subject: &Subject<'_>) -> Result<bool>;

    /// Narrow candidate class names; the default keeps all of them
    fn reduce_target_class_names(
        &self,
        _ctx: &MatchContext<'_>,
        index: &ClassNameIndex,
    ) -> Result<ClassNameIndex> {
        Ok(index.clone())
    }
}

impl<F> PointcutFilter for F
where
    F: Fn(&MatchContext<'_>, &Subject<'_>) -> Result<bool> + Send + Sync,
{
    fn matches(&self, ctx: &MatchContext<'_>, subject: &Subject<'_>) -> Result<bool> {
        self(ctx, subject)
    }
}

/// Resolves `filter(Name)` designators to filter objects
pub trait FilterResolver {
    /// # Errors
    ///
    /// [`AopError::Configuration`] if `name` is unknown or is not a pointcut filter.
    fn resolve_filter(&self, name: &str) -> Result<Arc<dyn PointcutFilter>>;
}

/// Condition of a `setting(...)` designator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingCondition {
    path: String,
    expected: Option<String>,
}

impl SettingCondition {
    pub fn new(path: impl Into<String>, expected: Option<String>) -> Self {
        SettingCondition {
            path: path.into(),
            expected,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    /// Missing paths and non-boolean values without a comparison are non-matches
    pub fn matches(&self, settings: &Settings) -> bool {
        let Some(value) = settings.get(&self.path) else {
            return false;
        };
        match &self.expected {
            None => matches!(value, Value::Bool(true)),
            Some(expected) => scalar_string(value).is_some_and(|s| s == *expected),
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl fmt::Display for SettingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expected {
            None => write!(f, "setting({})", self.path),
            Some(v) if v.contains('\'') => write!(f, "setting({} = \"{}\")", self.path, v),
            Some(v) => write!(f, "setting({} = '{}')", self.path, v),
        }
    }
}

/// Reference to a named pointcut, `AspectClass->pointcutName`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointcutReference {
    pub aspect_class: String,
    pub pointcut: String,
}

impl PointcutReference {
    pub fn new(aspect_class: impl Into<String>, pointcut: impl Into<String>) -> Self {
        PointcutReference {
            aspect_class: aspect_class.into(),
            pointcut: pointcut.into(),
        }
    }

    fn id(&self) -> String {
        format!("{}->{}", self.aspect_class, self.pointcut)
    }

    fn matches(&self, ctx: &MatchContext<'_>, subject: &Subject<'_>) -> Result<bool> {
        let _guard = ctx.enter(self.id())?;
        let target = ctx.find_pointcut(&self.aspect_class, &self.pointcut)?;
        target.composite().matches(ctx, subject)
    }

    fn reduce(&self, ctx: &MatchContext<'_>, index: &ClassNameIndex) -> Result<ClassNameIndex> {
        let _guard = ctx.enter(self.id())?;
        let target = ctx.find_pointcut(&self.aspect_class, &self.pointcut)?;
        target.composite().reduce_target_class_names(ctx, index)
    }
}

impl fmt::Display for PointcutReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.aspect_class, self.pointcut)
    }
}

/// `filter(Name)` designator, resolved against the object registry at weave time
#[derive(Clone)]
pub struct CustomFilter {
    name: String,
    resolved: Option<Arc<dyn PointcutFilter>>,
}

impl CustomFilter {
    pub fn unresolved(name: impl Into<String>) -> Self {
        CustomFilter {
            name: name.into(),
            resolved: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub(crate) fn resolve(&mut self, resolver: &dyn FilterResolver) -> Result<()> {
        self.resolved = Some(resolver.resolve_filter(&self.name)?);
        Ok(())
    }

    fn matches(&self, ctx: &MatchContext<'_>, subject: &Subject<'_>) -> Result<bool> {
        match &self.resolved {
            Some(filter) => filter.matches(ctx, subject),
            None => Err(AopError::configuration(format!(
                "custom filter \"{}\" has not been resolved",
                self.name
            ))),
        }
    }

    fn reduce(&self, ctx: &MatchContext<'_>, index: &ClassNameIndex) -> Result<ClassNameIndex> {
        match &self.resolved {
            Some(filter) => filter.reduce_target_class_names(ctx, index),
            None => Ok(index.clone()),
        }
    }
}

impl fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFilter")
            .field("name", &self.name)
            .field("resolved", &self.resolved.is_some())
            .finish()
    }
}

/// Atomic pointcut filter
#[derive(Debug, Clone)]
pub enum Filter {
    /// `class(Pattern)`
    ClassName(NamePattern),
    /// Matches classes implementing a matching interface
    ClassType(NamePattern),
    /// `classTaggedWith(Pattern)`
    ClassTaggedWith(NamePattern),
    /// Method part of `method(...)`
    MethodName {
        pattern: NamePattern,
        visibility: Option<Visibility>,
    },
    /// `methodTaggedWith(Pattern)`
    MethodTaggedWith(NamePattern),
    /// `within(Pattern)`
    Within(NamePattern),
    /// `setting(path)` / `setting(path = 'value')`
    Setting(SettingCondition),
    /// `AspectClass->pointcutName`
    PointcutReference(PointcutReference),
    /// `filter(Name)`
    Custom(CustomFilter),
}

impl Filter {
    pub fn matches(&self, ctx: &MatchContext<'_>, subject: &Subject<'_>) -> Result<bool> {
        let class = subject.class;
        match self {
            Filter::ClassName(pattern) => Ok(pattern.is_match(&class.name)),
            Filter::ClassType(pattern) => {
                Ok(pattern.matches_any(ctx.classes().interfaces_of(&class.name)))
            }
            Filter::ClassTaggedWith(pattern) => {
                Ok(pattern.matches_any(class.tags.iter().map(String::as_str)))
            }
            Filter::MethodName {
                pattern,
                visibility,
            } => Ok(match subject.method {
                None => true,
                Some(method) => {
                    pattern.is_match(&method.name)
                        && visibility.map_or(true, |v| v == method.visibility)
                }
            }),
            Filter::MethodTaggedWith(pattern) => Ok(match subject.method {
                None => true,
                Some(method) => pattern.matches_any(method.tags.iter().map(String::as_str)),
            }),
            Filter::Within(pattern) => Ok(is_within(ctx.classes(), pattern, &class.name)),
            Filter::Setting(condition) => Ok(condition.matches(ctx.settings())),
            Filter::PointcutReference(reference) => reference.matches(ctx, subject),
            Filter::Custom(custom) => custom.matches(ctx, subject),
        }
    }

    /// Narrow candidate class names to those this filter could match
    pub fn reduce_target_class_names(
        &self,
        ctx: &MatchContext<'_>,
        index: &ClassNameIndex,
    ) -> Result<ClassNameIndex> {
        let classes = ctx.classes();
        Ok(match self {
            Filter::ClassName(pattern) => index.filter(|name| pattern.is_match(name)),
            Filter::ClassType(pattern) => {
                index.filter(|name| pattern.matches_any(classes.interfaces_of(name)))
            }
            Filter::ClassTaggedWith(pattern) => index.filter(|name| {
                classes
                    .class(name)
                    .is_some_and(|c| pattern.matches_any(c.tags.iter().map(String::as_str)))
            }),
            Filter::Within(pattern) => index.filter(|name| is_within(classes, pattern, name)),
            Filter::Setting(condition) => {
                if condition.matches(ctx.settings()) {
                    index.clone()
                } else {
                    ClassNameIndex::default()
                }
            }
            Filter::MethodName { .. } | Filter::MethodTaggedWith(_) => index.clone(),
            Filter::PointcutReference(reference) => reference.reduce(ctx, index)?,
            Filter::Custom(custom) => custom.reduce(ctx, index)?,
        })
    }

    pub fn is_pointcut_reference(&self) -> bool {
        matches!(self, Filter::PointcutReference(_))
    }
}

fn is_within(classes: &ClassRegistry, pattern: &NamePattern, class_name: &str) -> bool {
    pattern.is_match(class_name)
        || pattern.matches_any(classes.ancestors_of(class_name))
        || pattern.matches_any(classes.interfaces_of(class_name))
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::ClassName(p) => write!(f, "class({})", p),
            Filter::ClassType(p) => write!(f, "classType({})", p),
            Filter::ClassTaggedWith(p) => write!(f, "classTaggedWith({})", p),
            Filter::MethodName {
                pattern,
                visibility: Some(v),
            } => write!(f, "methodName({} {})", v, pattern),
            Filter::MethodName {
                pattern,
                visibility: None,
            } => write!(f, "methodName({})", pattern),
            Filter::MethodTaggedWith(p) => write!(f, "methodTaggedWith({})", p),
            Filter::Within(p) => write!(f, "within({})", p),
            Filter::Setting(condition) => condition.fmt(f),
            Filter::PointcutReference(reference) => reference.fmt(f),
            Filter::Custom(custom) => write!(f, "filter({})", custom.name),
        }
    }
}
