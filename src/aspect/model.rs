use std::fmt;

use crate::error::Result;
use crate::pointcut::{ClassNameIndex, MatchContext, Pointcut};

/// When an advice runs relative to the advised method
///
/// The declaration order of the variants is the order in which the interceptor consults the
/// advice groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdviceKind {
    Before,
    Around,
    AfterReturning,
    AfterThrowing,
    After,
}

impl AdviceKind {
    pub const ALL: [AdviceKind; 5] = [
        AdviceKind::Before,
        AdviceKind::Around,
        AdviceKind::AfterReturning,
        AdviceKind::AfterThrowing,
        AdviceKind::After,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdviceKind::Before => "before",
            AdviceKind::Around => "around",
            AdviceKind::AfterReturning => "afterReturning",
            AdviceKind::AfterThrowing => "afterThrowing",
            AdviceKind::After => "after",
        }
    }
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An advice: which aspect method runs, and when
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Advice {
    pub kind: AdviceKind,
    pub aspect_class: String,
    pub method: String,
}

impl Advice {
    pub fn new(
        kind: AdviceKind,
        aspect_class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Advice {
            kind,
            aspect_class: aspect_class.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} ({})", self.aspect_class, self.method, self.kind)
    }
}

/// An advice bound to the pointcut that selects where it applies
#[derive(Debug, Clone)]
pub struct Advisor {
    pub pointcut: Pointcut,
    pub advice: Advice,
}

/// Interface introduced into every class matched by a class-level pointcut
#[derive(Debug, Clone)]
pub struct Introduction {
    pub pointcut: Pointcut,
    pub interface: String,
    pub aspect_class: String,
}

/// Everything a single aspect class declares
#[derive(Debug, Clone)]
pub struct AspectContainer {
    class_name: String,
    pub(crate) advisors: Vec<Advisor>,
    pub(crate) pointcuts: Vec<Pointcut>,
    pub(crate) introductions: Vec<Introduction>,
}

impl AspectContainer {
    pub fn new(class_name: impl Into<String>) -> Self {
        AspectContainer {
            class_name: class_name.into(),
            advisors: Vec::new(),
            pointcuts: Vec::new(),
            introductions: Vec::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn advisors(&self) -> &[Advisor] {
        &self.advisors
    }

    pub fn pointcuts(&self) -> &[Pointcut] {
        &self.pointcuts
    }

    pub fn introductions(&self) -> &[Introduction] {
        &self.introductions
    }

    /// Whether the aspect declares nothing at all
    pub fn is_empty(&self) -> bool {
        self.advisors.is_empty() && self.pointcuts.is_empty() && self.introductions.is_empty()
    }

    /// Named pointcut of this aspect
    pub fn pointcut(&self, name: &str) -> Option<&Pointcut> {
        self.pointcuts.iter().find(|p| p.name() == Some(name))
    }

    /// Classes any advisor or introduction of this aspect could apply to
    pub fn reduce_target_class_names(
        &self,
        ctx: &MatchContext<'_>,
        index: &ClassNameIndex,
    ) -> Result<ClassNameIndex> {
        let mut result = ClassNameIndex::default();
        for advisor in &self.advisors {
            result = result.union(&advisor.pointcut.reduce_target_class_names(ctx, index)?);
        }
        for introduction in &self.introductions {
            result = result.union(&introduction.pointcut.reduce_target_class_names(ctx, index)?);
        }
        Ok(result)
    }
}
