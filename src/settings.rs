//! Application settings consulted by the `setting(...)` pointcut designator.
//!
//! Settings are a plain tree loaded from YAML. Paths address nested keys either with dots
//! (`Acme.Blog.auditing.enabled`) or with colons (`Acme: Blog: auditing: enabled`), the two
//! spellings the pointcut DSL accepts.

use std::path::Path;

use anyhow::Context;
use serde_json::Value;

/// Immutable settings tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    root: Value,
}

impl Settings {
    /// Settings backed by an existing value
    pub fn from_value(root: Value) -> Self {
        Settings { root }
    }

    /// Parse settings from a YAML document
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let root: Value = serde_yaml::from_str(content).context("Failed to parse settings YAML")?;
        Ok(Settings { root })
    }

    /// Load settings from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Resolve a dotted or colon-delimited path
    ///
    /// Returns `None` for missing keys and for empty paths.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = split_path(path);
        if segments.is_empty() {
            return None;
        }
        let mut current = &self.root;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// Split a settings path into its segments
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split(['.', ':'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dotted_and_colon_paths_resolve_identically() {
        let settings = Settings::from_value(json!({
            "Acme": { "Blog": { "auditing": { "enabled": true } } }
        }));
        assert_eq!(settings.get("Acme.Blog.auditing.enabled"), Some(&json!(true)));
        assert_eq!(settings.get("Acme: Blog: auditing: enabled"), Some(&json!(true)));
    }

    #[test]
    fn test_missing_path_is_none() {
        let settings = Settings::from_yaml_str("Acme:\n  Blog:\n    mode: strict\n").unwrap();
        assert_eq!(settings.get("Acme.Blog.mode"), Some(&json!("strict")));
        assert!(settings.get("Acme.Blog.mode.deeper").is_none());
        assert!(settings.get("Acme.Shop").is_none());
        assert!(settings.get("").is_none());
    }
}
