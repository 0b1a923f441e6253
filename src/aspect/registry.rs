use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::model::{Advice, AdviceKind, Advisor, AspectContainer, Introduction};
use crate::error::{AopError, Result};
use crate::pointcut::{
    expression_text, FilterResolver, Pointcut, PointcutExpressionParser, PointcutLookup,
};
use crate::reflection::{AdviceDeclaration, ClassInfo, ClassRegistry};

/// All aspects of the system, in sorted class-name order
///
/// Built once per weave. Every expression is parsed and every custom filter resolved while
/// building, so a registry that exists is known to be syntactically sound.
#[derive(Debug, Clone, Default)]
pub struct AspectRegistry {
    containers: Vec<AspectContainer>,
}

impl AspectRegistry {
    /// Collect aspect containers from every class tagged `aspect_tag`
    ///
    /// # Errors
    ///
    /// - [`AopError::InvalidExpression`] for expressions that do not parse
    /// - [`AopError::Configuration`] for aspects declaring nothing, duplicate pointcut names and
    ///   custom filters the resolver does not know
    pub fn build(
        classes: &ClassRegistry,
        aspect_tag: &str,
        filters: &dyn FilterResolver,
    ) -> Result<Self> {
        let parser = PointcutExpressionParser::new();
        let mut containers = Vec::new();

        for class in classes.classes() {
            if !class.has_tag(aspect_tag) {
                if class.methods.iter().any(|m| !m.advice.is_empty())
                    || !class.introductions.is_empty()
                {
                    warn!(
                        class = %class.name,
                        tag = aspect_tag,
                        "Class declares advice but is not tagged as an aspect, ignoring"
                    );
                }
                continue;
            }
            let container = build_container(&parser, class, filters)?;
            debug!(
                aspect = %class.name,
                advisors = container.advisors.len(),
                pointcuts = container.pointcuts.len(),
                introductions = container.introductions.len(),
                "Aspect container built"
            );
            containers.push(container);
        }

        info!(aspects = containers.len(), "Aspect registry built");
        Ok(AspectRegistry { containers })
    }

    /// Registry over already built containers, sorted by class name
    pub fn from_containers(mut containers: Vec<AspectContainer>) -> Self {
        containers.sort_by(|a, b| a.class_name().cmp(b.class_name()));
        AspectRegistry { containers }
    }

    pub fn containers(&self) -> &[AspectContainer] {
        &self.containers
    }

    pub fn container(&self, class_name: &str) -> Option<&AspectContainer> {
        self.containers
            .binary_search_by(|c| c.class_name().cmp(class_name))
            .ok()
            .and_then(|i| self.containers.get(i))
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Names of all aspect classes
    pub fn aspect_classes(&self) -> BTreeSet<&str> {
        self.containers.iter().map(|c| c.class_name()).collect()
    }

    /// Every advisor, aspect order then declaration order
    pub fn advisors(&self) -> impl Iterator<Item = &Advisor> {
        self.containers.iter().flat_map(|c| c.advisors.iter())
    }

    /// Every introduction, aspect order then declaration order
    pub fn introductions(&self) -> impl Iterator<Item = &Introduction> {
        self.containers.iter().flat_map(|c| c.introductions.iter())
    }
}

impl PointcutLookup for AspectRegistry {
    fn find_pointcut(&self, aspect_class: &str, name: &str) -> Option<&Pointcut> {
        self.container(aspect_class)?.pointcut(name)
    }
}

fn build_container(
    parser: &PointcutExpressionParser,
    class: &ClassInfo,
    filters: &dyn FilterResolver,
) -> Result<AspectContainer> {
    let mut container = AspectContainer::new(&class.name);

    for method in &class.methods {
        for declaration in &method.advice {
            let (kind, value) = split_declaration(declaration);
            let hint = match kind {
                Some(kind) => format!("{}::{} ({} advice)", class.name, method.name, kind),
                None => format!("{}::{} (pointcut)", class.name, method.name),
            };
            let name = kind.is_none().then(|| method.name.clone());
            let pointcut = parse_pointcut(parser, value, &hint, &class.name, name, filters)?;
            match kind {
                Some(kind) => container.advisors.push(Advisor {
                    pointcut,
                    advice: Advice::new(kind, &class.name, &method.name),
                }),
                None => {
                    if container.pointcut(&method.name).is_some() {
                        return Err(AopError::configuration(format!(
                            "pointcut \"{}\" is declared twice in aspect class \"{}\"",
                            method.name, class.name
                        )));
                    }
                    container.pointcuts.push(pointcut);
                }
            }
        }
    }

    for introduction in &class.introductions {
        let hint = format!("{} (introduction of {})", class.name, introduction.interface);
        let pointcut = parse_pointcut(
            parser,
            &introduction.pointcut,
            &hint,
            &class.name,
            None,
            filters,
        )?;
        container.introductions.push(Introduction {
            pointcut,
            interface: introduction.interface.clone(),
            aspect_class: class.name.clone(),
        });
    }

    if container.is_empty() {
        return Err(AopError::configuration(format!(
            "aspect class \"{}\" declares no advice, pointcuts or introductions",
            class.name
        )));
    }
    Ok(container)
}

fn parse_pointcut(
    parser: &PointcutExpressionParser,
    value: &Value,
    hint: &str,
    aspect_class: &str,
    name: Option<String>,
    filters: &dyn FilterResolver,
) -> Result<Pointcut> {
    let expression = expression_text(value, hint)?;
    let composite = parser.parse(expression, hint)?;
    let mut pointcut = Pointcut::new(name, aspect_class, expression, composite);
    pointcut.composite_mut().resolve_custom_filters(filters)?;
    Ok(pointcut)
}

fn split_declaration(declaration: &AdviceDeclaration) -> (Option<AdviceKind>, &Value) {
    match declaration {
        AdviceDeclaration::Before(v) => (Some(AdviceKind::Before), v),
        AdviceDeclaration::After(v) => (Some(AdviceKind::After), v),
        AdviceDeclaration::AfterReturning(v) => (Some(AdviceKind::AfterReturning), v),
        AdviceDeclaration::AfterThrowing(v) => (Some(AdviceKind::AfterThrowing), v),
        AdviceDeclaration::Around(v) => (Some(AdviceKind::Around), v),
        AdviceDeclaration::Pointcut(v) => (None, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointcut::{MatchContext, PointcutFilter, Subject};
    use crate::reflection::{parse_manifest, ClassRegistry};
    use std::sync::Arc;

    struct NoFilters;

    impl FilterResolver for NoFilters {
        fn resolve_filter(&self, name: &str) -> Result<Arc<dyn PointcutFilter>> {
            Err(AopError::configuration(format!("unknown filter \"{}\"", name)))
        }
    }

    fn registry(yaml: &str) -> ClassRegistry {
        ClassRegistry::from_manifest(parse_manifest(yaml, true).unwrap()).unwrap()
    }

    const MANIFEST: &str = r#"
interfaces:
  - name: Acme::Auditable
    methods: [{ name: audit_trail, default: true }]
classes:
  - name: Acme::ZetaAspect
    tags: [aspect]
    methods:
      - name: trace
        advice:
          - before: "Acme::AlphaAspect->services"
  - name: Acme::AlphaAspect
    tags: [aspect]
    introductions:
      - { interface: Acme::Auditable, pointcut: "class(Acme::Service)" }
    methods:
      - name: services
        advice:
          - pointcut: "class(Acme::.*Service)"
      - name: wrap
        advice:
          - around: "Acme::AlphaAspect->services"
          - after_throwing: "method(Acme::Service->run())"
  - name: Acme::Service
    methods: [{ name: run }]
"#;

    #[test]
    fn test_containers_are_sorted_and_keep_declaration_order() {
        let classes = registry(MANIFEST);
        let aspects = AspectRegistry::build(&classes, "aspect", &NoFilters).unwrap();
        let names: Vec<_> = aspects.containers().iter().map(|c| c.class_name()).collect();
        assert_eq!(names, vec!["Acme::AlphaAspect", "Acme::ZetaAspect"]);

        let advice: Vec<_> = aspects.advisors().map(|a| a.advice.to_string()).collect();
        assert_eq!(
            advice,
            vec![
                "Acme::AlphaAspect::wrap (around)",
                "Acme::AlphaAspect::wrap (afterThrowing)",
                "Acme::ZetaAspect::trace (before)",
            ]
        );
        assert_eq!(aspects.introductions().count(), 1);
    }

    #[test]
    fn test_named_pointcuts_are_found_across_aspects() {
        let classes = registry(MANIFEST);
        let aspects = AspectRegistry::build(&classes, "aspect", &NoFilters).unwrap();
        let pointcut = aspects
            .find_pointcut("Acme::AlphaAspect", "services")
            .unwrap();
        assert_eq!(pointcut.expression(), "class(Acme::.*Service)");
        assert!(aspects.find_pointcut("Acme::ZetaAspect", "services").is_none());

        let settings = crate::settings::Settings::default();
        let ctx = MatchContext::new(&classes, &settings, &aspects, 1);
        let service = classes.class("Acme::Service").unwrap();
        let trace = &aspects.container("Acme::ZetaAspect").unwrap().advisors()[0];
        assert!(trace
            .pointcut
            .matches(&ctx, &Subject::class_level(service))
            .unwrap());
    }

    #[test]
    fn test_empty_aspect_is_a_configuration_error() {
        let classes = registry("classes:\n  - { name: Acme::Idle, tags: [aspect] }\n");
        let err = AspectRegistry::build(&classes, "aspect", &NoFilters).unwrap_err();
        assert!(matches!(err, AopError::Configuration { .. }));
        assert!(err.to_string().contains("Acme::Idle"));
    }

    #[test]
    fn test_parse_errors_carry_the_declaring_method() {
        let classes = registry(
            r#"
classes:
  - name: Acme::Broken
    tags: [aspect]
    methods:
      - name: log
        advice:
          - around: "method(Acme::Foo)"
"#,
        );
        match AspectRegistry::build(&classes, "aspect", &NoFilters) {
            Err(AopError::InvalidExpression { source_hint, .. }) => {
                assert_eq!(source_hint, "Acme::Broken::log (around advice)")
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_expression_is_rejected() {
        let classes = registry(
            r#"
classes:
  - name: Acme::Broken
    tags: [aspect]
    methods:
      - name: log
        advice:
          - before: 42
"#,
        );
        assert!(matches!(
            AspectRegistry::build(&classes, "aspect", &NoFilters),
            Err(AopError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_unknown_custom_filter_fails_the_build() {
        let classes = registry(
            r#"
classes:
  - name: Acme::Filtered
    tags: [aspect]
    methods:
      - name: log
        advice:
          - before: "filter(Acme::Missing)"
"#,
        );
        assert!(matches!(
            AspectRegistry::build(&classes, "aspect", &NoFilters),
            Err(AopError::Configuration { .. })
        ));
    }

    #[test]
    fn test_untagged_classes_are_not_aspects() {
        let classes = registry(MANIFEST);
        let aspects = AspectRegistry::build(&classes, "interceptor", &NoFilters).unwrap();
        assert!(aspects.is_empty());
    }
}
