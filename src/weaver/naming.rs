use std::collections::BTreeSet;

use crate::reflection::{ClassInfo, ClassRegistry, NAMESPACE_SEPARATOR};

/// Issues collision-free proxy class names
///
/// A proxy for `Acme::Blog::Post` is called `Acme::Blog::PostAopProxy`. If that name is taken by
/// a manifest class or was issued before by the same namer (a re-weave in a long-lived process),
/// `_v2`, `_v3` and so on are appended.
#[derive(Debug, Clone, Default)]
pub struct ProxyNamer {
    suffix: String,
    issued: BTreeSet<String>,
}

impl ProxyNamer {
    pub fn new(suffix: impl Into<String>) -> Self {
        ProxyNamer {
            suffix: suffix.into(),
            issued: BTreeSet::new(),
        }
    }

    pub fn proxy_name(&mut self, classes: &ClassRegistry, target: &ClassInfo) -> String {
        let namespace = target.namespace();
        let base = if namespace.is_empty() {
            format!("{}{}", target.short_name(), self.suffix)
        } else {
            format!(
                "{}{}{}{}",
                namespace,
                NAMESPACE_SEPARATOR,
                target.short_name(),
                self.suffix
            )
        };

        let mut candidate = base.clone();
        let mut version = 1;
        while classes.contains(&candidate) || self.issued.contains(&candidate) {
            version += 1;
            candidate = format!("{}_v{}", base, version);
        }
        self.issued.insert(candidate.clone());
        candidate
    }

    /// Number of names issued so far
    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::ClassManifest;

    #[test]
    fn test_names_are_versioned_on_collision() {
        let classes = ClassRegistry::from_manifest(ClassManifest {
            interfaces: vec![],
            classes: vec![
                ClassInfo::named("Acme::Blog::Post"),
                ClassInfo::named("Acme::Blog::PostAopProxy"),
                ClassInfo::named("Global"),
            ],
        })
        .unwrap();
        let post = classes.class("Acme::Blog::Post").unwrap();
        let mut namer = ProxyNamer::new("AopProxy");

        assert_eq!(namer.proxy_name(&classes, post), "Acme::Blog::PostAopProxy_v2");
        assert_eq!(namer.proxy_name(&classes, post), "Acme::Blog::PostAopProxy_v3");
        let global = classes.class("Global").unwrap();
        assert_eq!(namer.proxy_name(&classes, global), "GlobalAopProxy");
        assert_eq!(namer.issued(), 3);
    }
}
