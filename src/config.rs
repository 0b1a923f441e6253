//! # Weaver Configuration
//!
//! Settings that shape a weave without being part of the class manifest.
//!
//! ## Sources
//!
//! Configuration is read from an optional YAML file and then overridden from the environment:
//!
//! ```yaml
//! excluded_namespaces: ["Acme::Vendor", "Acme::Generated"]
//! proxy_suffix: AopProxy
//! aspect_tag: aspect
//! ```
//!
//! ## Environment Variables
//!
//! ### `AOPW_EXCLUDED_NAMESPACES`
//!
//! Comma separated namespaces whose classes are never woven. Replaces the file value.
//!
//! ### `AOPW_PROXY_SUFFIX`
//!
//! Suffix appended to a class's short name to form its proxy name. Default: `AopProxy`
//!
//! ## Usage
//!
//! ```rust
//! use aopweave::config::WeaverConfig;
//!
//! let config = WeaverConfig::from_env();
//! assert_eq!(config.aspect_tag, "aspect");
//! ```

use std::env;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::reflection::NAMESPACE_SEPARATOR;

pub const DEFAULT_PROXY_SUFFIX: &str = "AopProxy";
pub const DEFAULT_ASPECT_TAG: &str = "aspect";

/// Weaver configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WeaverConfig {
    /// Namespaces whose classes are never woven (default: none)
    pub excluded_namespaces: Vec<String>,
    /// Suffix of generated proxy class names (default: `AopProxy`)
    pub proxy_suffix: String,
    /// Tag marking aspect classes in the manifest (default: `aspect`)
    pub aspect_tag: String,
}

impl Default for WeaverConfig {
    fn default() -> Self {
        WeaverConfig {
            excluded_namespaces: Vec::new(),
            proxy_suffix: DEFAULT_PROXY_SUFFIX.to_string(),
            aspect_tag: DEFAULT_ASPECT_TAG.to_string(),
        }
    }
}

impl WeaverConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = WeaverConfig::default();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Load a YAML config file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read weaver config {}", path.display()))?;
                serde_yaml::from_str(&content)
                    .with_context(|| format!("Invalid weaver config {}", path.display()))?
            }
            None => WeaverConfig::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("AOPW_EXCLUDED_NAMESPACES") {
            self.excluded_namespaces = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(value) = lookup("AOPW_PROXY_SUFFIX") {
            let value = value.trim();
            if !value.is_empty() {
                self.proxy_suffix = value.to_string();
            }
        }
    }

    /// Whether a class lives in (or below) an excluded namespace
    pub fn is_excluded(&self, class_name: &str) -> bool {
        self.excluded_namespaces.iter().any(|ns| {
            let ns = ns.trim_end_matches(NAMESPACE_SEPARATOR);
            class_name
                .strip_prefix(ns)
                .is_some_and(|rest| rest.starts_with(NAMESPACE_SEPARATOR))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_replace_file_values() {
        let mut config: WeaverConfig =
            serde_yaml::from_str("excluded_namespaces: [Acme::Vendor]\n").unwrap();
        assert_eq!(config.proxy_suffix, DEFAULT_PROXY_SUFFIX);

        config.apply_overrides(|key| match key {
            "AOPW_EXCLUDED_NAMESPACES" => Some("Acme::Generated, ,Acme::Legacy".into()),
            "AOPW_PROXY_SUFFIX" => Some("Woven".into()),
            _ => None,
        });
        assert_eq!(
            config.excluded_namespaces,
            vec!["Acme::Generated".to_string(), "Acme::Legacy".to_string()]
        );
        assert_eq!(config.proxy_suffix, "Woven");
    }

    #[test]
    fn test_exclusion_respects_namespace_boundaries() {
        let config = WeaverConfig {
            excluded_namespaces: vec!["Acme::Vendor".into()],
            ..WeaverConfig::default()
        };
        assert!(config.is_excluded("Acme::Vendor::Client"));
        assert!(config.is_excluded("Acme::Vendor::Http::Client"));
        assert!(!config.is_excluded("Acme::VendorPortal"));
        assert!(!config.is_excluded("Acme::Vendor"));
    }
}
