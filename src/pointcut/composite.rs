use std::fmt;

use super::class_index::ClassNameIndex;
use super::filter::{Filter, FilterResolver, MatchContext, PointcutReference, Subject};
use crate::error::Result;

/// Operator joining a matcher to the result accumulated so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    AndNot,
    OrNot,
}

impl Operator {
    /// Negated form of this operator (`&&` → `&&!`)
    pub fn negated(self) -> Self {
        match self {
            Operator::And => Operator::AndNot,
            Operator::Or => Operator::OrNot,
            Operator::AndNot => Operator::And,
            Operator::OrNot => Operator::Or,
        }
    }

    pub fn is_negated(self) -> bool {
        matches!(self, Operator::AndNot | Operator::OrNot)
    }

    #[inline]
    fn apply(self, accumulated: bool, matched: bool) -> bool {
        match self {
            Operator::And => accumulated && matched,
            Operator::AndNot => accumulated && !matched,
            Operator::Or => accumulated || matched,
            Operator::OrNot => accumulated || !matched,
        }
    }

    /// Whether the accumulated value already decides the result for this operator
    #[inline]
    fn is_decided(self, accumulated: bool) -> bool {
        match self {
            Operator::And | Operator::AndNot => !accumulated,
            Operator::Or | Operator::OrNot => accumulated,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::AndNot => "&&!",
            Operator::OrNot => "||!",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element of a composite: a filter or a nested composite
#[derive(Debug, Clone)]
pub enum Matcher {
    Filter(Filter),
    Composite(FilterComposite),
}

impl Matcher {
    fn matches(&self, ctx: &MatchContext<'_>, subject: &Subject<'_>) -> Result<bool> {
        match self {
            Matcher::Filter(filter) => filter.matches(ctx, subject),
            Matcher::Composite(composite) => composite.evaluate(ctx, subject),
        }
    }

    fn reduce(&self, ctx: &MatchContext<'_>, index: &ClassNameIndex) -> Result<ClassNameIndex> {
        match self {
            Matcher::Filter(filter) => filter.reduce_target_class_names(ctx, index),
            Matcher::Composite(composite) => composite.reduce_target_class_names(ctx, index),
        }
    }

    fn has_pointcut_reference(&self) -> bool {
        match self {
            Matcher::Filter(filter) => filter.is_pointcut_reference(),
            Matcher::Composite(composite) => composite.has_pointcut_reference(),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Filter(filter) => filter.fmt(f),
            Matcher::Composite(composite) => match composite.origin() {
                Some(origin) => f.write_str(origin),
                None => write!(f, "({})", composite),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    operator: Operator,
    matcher: Matcher,
    references: bool,
}

/// Ordered list of `(operator, matcher)` pairs evaluated as a left-to-right fold
///
/// There is no operator precedence: `a || b && c` means `(a || b) && c`. The accumulator starts
/// at `true`, so a leading `&&` is neutral.
#[derive(Debug, Clone, Default)]
pub struct FilterComposite {
    entries: Vec<Entry>,
    origin: Option<String>,
}

impl FilterComposite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite standing for a single designator, rendered as `origin` when displayed
    pub fn with_origin(origin: impl Into<String>) -> Self {
        FilterComposite {
            entries: Vec::new(),
            origin: Some(origin.into()),
        }
    }

    pub fn add_filter(&mut self, operator: Operator, filter: Filter) {
        let references = filter.is_pointcut_reference();
        self.entries.push(Entry {
            operator,
            matcher: Matcher::Filter(filter),
            references,
        });
    }

    pub fn add_composite(&mut self, operator: Operator, composite: FilterComposite) {
        let references = composite.has_pointcut_reference();
        self.entries.push(Entry {
            operator,
            matcher: Matcher::Composite(composite),
            references,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Operators in declaration order
    pub fn operators(&self) -> Vec<Operator> {
        self.entries.iter().map(|e| e.operator).collect()
    }

    /// `(operator, matcher)` pairs in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (Operator, &Matcher)> {
        self.entries.iter().map(|e| (e.operator, &e.matcher))
    }

    pub fn has_pointcut_reference(&self) -> bool {
        self.entries.iter().any(|e| e.references)
    }

    /// Every pointcut reference in this composite, nested ones included
    pub fn pointcut_references(&self) -> Vec<&PointcutReference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a PointcutReference>) {
        for entry in &self.entries {
            match &entry.matcher {
                Matcher::Filter(Filter::PointcutReference(r)) => out.push(r),
                Matcher::Filter(_) => {}
                Matcher::Composite(c) => c.collect_references(out),
            }
        }
    }

    /// Whether the subject matches
    ///
    /// Final classes and final methods never match.
    pub fn matches(&self, ctx: &MatchContext<'_>, subject: &Subject<'_>) -> Result<bool> {
        if subject.class.is_final || subject.method.is_some_and(|m| m.is_final) {
            return Ok(false);
        }
        self.evaluate(ctx, subject)
    }

    fn evaluate(&self, ctx: &MatchContext<'_>, subject: &Subject<'_>) -> Result<bool> {
        let mut result = true;
        for entry in &self.entries {
            // Skipping is only safe when no reference below could report a cycle.
            if entry.operator.is_decided(result) && !entry.references {
                continue;
            }
            let matched = entry.matcher.matches(ctx, subject)?;
            result = entry.operator.apply(result, matched);
        }
        Ok(result)
    }

    /// Narrow candidate class names to those this composite could match
    ///
    /// `&&` intersects with the narrowed set, `||` unions with the filter's reduction of the
    /// full input. Negated operators cannot be narrowed: `&&!` keeps the current set and
    /// `||!` widens back to the full input.
    pub fn reduce_target_class_names(
        &self,
        ctx: &MatchContext<'_>,
        index: &ClassNameIndex,
    ) -> Result<ClassNameIndex> {
        let mut result = index.clone();
        for entry in &self.entries {
            result = match entry.operator {
                Operator::And => result.intersect(&entry.matcher.reduce(ctx, &result)?),
                Operator::Or => result.union(&entry.matcher.reduce(ctx, index)?),
                Operator::AndNot => result,
                Operator::OrNot => index.clone(),
            };
        }
        Ok(result)
    }

    /// Resolve every `filter(Name)` designator, nested ones included
    pub fn resolve_custom_filters(&mut self, resolver: &dyn FilterResolver) -> Result<()> {
        for entry in &mut self.entries {
            match &mut entry.matcher {
                Matcher::Filter(Filter::Custom(custom)) => custom.resolve(resolver)?,
                Matcher::Filter(_) => {}
                Matcher::Composite(composite) => composite.resolve_custom_filters(resolver)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for FilterComposite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            match (i, entry.operator) {
                (0, Operator::And | Operator::Or) => {}
                (0, Operator::AndNot | Operator::OrNot) => f.write_str("!")?,
                (_, Operator::And) => f.write_str(" && ")?,
                (_, Operator::Or) => f.write_str(" || ")?,
                (_, Operator::AndNot) => f.write_str(" && !")?,
                (_, Operator::OrNot) => f.write_str(" || !")?,
            }
            entry.matcher.fmt(f)?;
        }
        Ok(())
    }
}
