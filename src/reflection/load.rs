use std::path::Path;

use anyhow::Context;

use super::model::ClassManifest;
use super::registry::ClassRegistry;

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}

/// Parse a manifest document from a string
///
/// `yaml` selects the YAML parser; JSON is used otherwise. YAML documents are read into a JSON
/// tree first so advice declarations use the same `{ around: "..." }` map form in both formats.
pub fn parse_manifest(content: &str, yaml: bool) -> anyhow::Result<ClassManifest> {
    let manifest = if yaml {
        let tree: serde_json::Value = serde_yaml::from_str(content)?;
        serde_json::from_value(tree)?
    } else {
        serde_json::from_str(content)?
    };
    Ok(manifest)
}

/// Load a class manifest (YAML or JSON, chosen by file extension) and build the class registry
pub fn load_manifest(path: impl AsRef<Path>) -> anyhow::Result<ClassRegistry> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read class manifest {}", path.display()))?;
    let manifest = parse_manifest(&content, is_yaml(path))
        .with_context(|| format!("Failed to parse class manifest {}", path.display()))?;
    let registry = ClassRegistry::from_manifest(manifest)
        .with_context(|| format!("Invalid class manifest {}", path.display()))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{AdviceDeclaration, Visibility};

    const MANIFEST: &str = r#"
interfaces:
  - name: Acme::Blog::Auditable
    methods:
      - { name: audit_trail, default: true }
classes:
  - name: Acme::Blog::Post
    tags: [entity]
    methods:
      - { name: publish }
      - { name: slug, visibility: protected, final: true }
  - name: Acme::Blog::AuditAspect
    tags: [aspect]
    introductions:
      - { interface: Acme::Blog::Auditable, pointcut: "classTaggedWith(entity)" }
    methods:
      - name: record
        advice:
          - after_returning: "method(Acme::Blog::Post->publish())"
          - pointcut: "classTaggedWith(entity)"
"#;

    #[test]
    fn test_parse_yaml_manifest() {
        let manifest = parse_manifest(MANIFEST, true).unwrap();
        assert_eq!(manifest.classes.len(), 2);
        let post = &manifest.classes[0];
        assert_eq!(post.methods[1].visibility, Visibility::Protected);
        assert!(post.methods[1].is_final);

        let aspect = &manifest.classes[1];
        assert_eq!(aspect.introductions[0].interface, "Acme::Blog::Auditable");
        assert!(matches!(
            aspect.methods[0].advice[0],
            AdviceDeclaration::AfterReturning(_)
        ));
        assert!(matches!(aspect.methods[0].advice[1], AdviceDeclaration::Pointcut(_)));
    }

    #[test]
    fn test_yaml_advice_keeps_raw_expression_values() {
        let yaml = r#"
classes:
  - name: Acme::TimingAspect
    tags: [aspect]
    methods:
      - name: time
        advice:
          - around: 42
          - before: "class(Acme::.*)"
"#;
        let manifest = parse_manifest(yaml, true).unwrap();
        let advice = &manifest.classes[0].methods[0].advice;
        assert_eq!(advice[0], AdviceDeclaration::Around(serde_json::json!(42)));
        assert_eq!(
            advice[1],
            AdviceDeclaration::Before(serde_json::json!("class(Acme::.*)"))
        );
    }

    #[test]
    fn test_parse_json_manifest() {
        let json = r#"{"classes":[{"name":"Foo","methods":[{"name":"bar","static":true}]}]}"#;
        let manifest = parse_manifest(json, false).unwrap();
        assert!(manifest.classes[0].methods[0].is_static);
        assert!(manifest.interfaces.is_empty());
    }

    #[test]
    fn test_load_manifest_reports_path_on_error() {
        let err = load_manifest("does/not/exist.yaml").unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.yaml"));
    }
}
