use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::model::{ClassInfo, ClassManifest, InterfaceInfo, InterfaceMethod, MethodInfo};
use crate::error::{AopError, Result};

/// A method as seen from a concrete class, together with the class that declares it
#[derive(Debug, Clone, Copy)]
pub struct ClassMethod<'a> {
    pub method: &'a MethodInfo,
    pub declaring_class: &'a str,
}

/// Read-only view over all classes and interfaces of the system being woven
///
/// This is the reflection boundary of the weaver: every question the matching engine asks
/// about type hierarchies, tags or methods is answered here. The registry is validated on
/// construction, so lookups of parents and interfaces never dangle.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: BTreeMap<String, ClassInfo>,
    interfaces: BTreeMap<String, InterfaceInfo>,
}

impl ClassRegistry {
    /// Build and validate a registry from a parsed manifest
    ///
    /// # Errors
    ///
    /// Returns [`AopError::Manifest`] for duplicate names, unknown parents or interfaces and
    /// for cyclic class or interface hierarchies.
    pub fn from_manifest(manifest: ClassManifest) -> Result<Self> {
        let mut classes = BTreeMap::new();
        let mut interfaces = BTreeMap::new();

        for interface in manifest.interfaces {
            if interfaces.contains_key(&interface.name) {
                return Err(AopError::manifest(format!(
                    "interface \"{}\" is declared twice",
                    interface.name
                )));
            }
            interfaces.insert(interface.name.clone(), interface);
        }
        for class in manifest.classes {
            if classes.contains_key(&class.name) || interfaces.contains_key(&class.name) {
                return Err(AopError::manifest(format!(
                    "class \"{}\" is declared twice",
                    class.name
                )));
            }
            classes.insert(class.name.clone(), class);
        }

        let registry = ClassRegistry {
            classes,
            interfaces,
        };
        registry.validate()?;

        debug!(
            classes = registry.classes.len(),
            interfaces = registry.interfaces.len(),
            "Class registry built"
        );
        Ok(registry)
    }

    fn validate(&self) -> Result<()> {
        for class in self.classes.values() {
            if let Some(parent) = &class.parent {
                if !self.classes.contains_key(parent) {
                    return Err(AopError::manifest(format!(
                        "class \"{}\" extends unknown class \"{}\"",
                        class.name, parent
                    )));
                }
            }
            for interface in &class.interfaces {
                if !self.interfaces.contains_key(interface) {
                    return Err(AopError::manifest(format!(
                        "class \"{}\" implements unknown interface \"{}\"",
                        class.name, interface
                    )));
                }
            }
            for introduction in &class.introductions {
                if !self.interfaces.contains_key(&introduction.interface) {
                    return Err(AopError::manifest(format!(
                        "aspect \"{}\" introduces unknown interface \"{}\"",
                        class.name, introduction.interface
                    )));
                }
            }

            let mut seen = BTreeSet::new();
            let mut current = Some(class.name.as_str());
            while let Some(name) = current {
                if !seen.insert(name) {
                    return Err(AopError::manifest(format!(
                        "class hierarchy of \"{}\" is cyclic",
                        class.name
                    )));
                }
                current = self.classes.get(name).and_then(|c| c.parent.as_deref());
            }
        }

        for interface in self.interfaces.values() {
            for parent in &interface.extends {
                if !self.interfaces.contains_key(parent) {
                    return Err(AopError::manifest(format!(
                        "interface \"{}\" extends unknown interface \"{}\"",
                        interface.name, parent
                    )));
                }
            }
            let mut visiting = Vec::new();
            self.check_interface_cycle(&interface.name, &mut visiting)?;
        }
        Ok(())
    }

    fn check_interface_cycle<'a>(
        &'a self,
        name: &'a str,
        visiting: &mut Vec<&'a str>,
    ) -> Result<()> {
        if visiting.contains(&name) {
            return Err(AopError::manifest(format!(
                "interface hierarchy of \"{}\" is cyclic",
                name
            )));
        }
        visiting.push(name);
        if let Some(interface) = self.interfaces.get(name) {
            for parent in &interface.extends {
                self.check_interface_cycle(parent, visiting)?;
            }
        }
        visiting.pop();
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceInfo> {
        self.interfaces.get(name)
    }

    /// Whether any class or interface carries this name
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name) || self.interfaces.contains_key(name)
    }

    /// All classes, sorted by name
    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    /// All class names, sorted
    pub fn class_names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    /// Parent chain of a class, nearest first, not including the class itself
    pub fn ancestors_of(&self, class_name: &str) -> Vec<&str> {
        let mut ancestors = Vec::new();
        let mut current = self.classes.get(class_name).and_then(|c| c.parent.as_deref());
        while let Some(name) = current {
            ancestors.push(name);
            current = self.classes.get(name).and_then(|c| c.parent.as_deref());
        }
        ancestors
    }

    /// Every interface a class implements, directly, through its parents or through interface
    /// inheritance, sorted
    pub fn interfaces_of(&self, class_name: &str) -> Vec<&str> {
        let mut result = BTreeSet::new();
        let mut lineage = vec![class_name];
        lineage.extend(self.ancestors_of(class_name));
        for name in lineage {
            if let Some(class) = self.classes.get(name) {
                for interface in &class.interfaces {
                    self.collect_interface(interface, &mut result);
                }
            }
        }
        result.into_iter().collect()
    }

    fn collect_interface<'a>(&'a self, name: &'a str, out: &mut BTreeSet<&'a str>) {
        if !out.insert(name) {
            return;
        }
        if let Some(interface) = self.interfaces.get(name) {
            for parent in &interface.extends {
                self.collect_interface(parent, out);
            }
        }
    }

    /// Methods of a class including inherited ones, own methods first
    ///
    /// An inherited method that the class overrides is reported once, with the overriding
    /// class as the declaring class.
    pub fn methods_of(&self, class_name: &str) -> Vec<ClassMethod<'_>> {
        let mut methods: Vec<ClassMethod<'_>> = Vec::new();
        let mut lineage = Vec::new();
        if let Some(class) = self.classes.get(class_name) {
            lineage.push(class);
        }
        for ancestor in self.ancestors_of(class_name) {
            if let Some(class) = self.classes.get(ancestor) {
                lineage.push(class);
            }
        }

        for class in lineage {
            for method in &class.methods {
                if methods.iter().any(|m| m.method.name == method.name) {
                    continue;
                }
                methods.push(ClassMethod {
                    method,
                    declaring_class: &class.name,
                });
            }
        }
        methods
    }

    /// Look up a method on a class, searching parents
    pub fn find_method(&self, class_name: &str, method_name: &str) -> Option<ClassMethod<'_>> {
        self.methods_of(class_name)
            .into_iter()
            .find(|m| m.method.name == method_name)
    }

    /// Every method an interface declares, including inherited interface methods
    pub fn interface_methods(&self, interface_name: &str) -> Vec<(&str, &InterfaceMethod)> {
        let mut names = BTreeSet::new();
        self.collect_interface(interface_name, &mut names);

        let mut result: Vec<(&str, &InterfaceMethod)> = Vec::new();
        // Declared methods of the interface itself first, then inherited ones.
        let mut ordered: Vec<&str> = vec![interface_name];
        ordered.extend(names.into_iter().filter(|n| *n != interface_name));
        for name in ordered {
            if let Some(interface) = self.interfaces.get(name) {
                for method in &interface.methods {
                    if result.iter().any(|(_, m)| m.name == method.name) {
                        continue;
                    }
                    result.push((interface.name.as_str(), method));
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> ClassManifest {
        let mut base = ClassInfo::named("Acme::Persistence::Repository");
        base.interfaces = vec!["Acme::Persistence::RepositoryInterface".into()];
        base.methods = vec![MethodInfo::synthetic("add"), MethodInfo::synthetic("remove")];

        let mut posts = ClassInfo::named("Acme::Blog::PostRepository");
        posts.parent = Some(base.name.clone());
        posts.methods = vec![MethodInfo::synthetic("add"), MethodInfo::synthetic("find_recent")];

        ClassManifest {
            interfaces: vec![
                InterfaceInfo {
                    name: "Acme::Persistence::RepositoryInterface".into(),
                    extends: vec!["Acme::Persistence::Countable".into()],
                    methods: vec![],
                },
                InterfaceInfo {
                    name: "Acme::Persistence::Countable".into(),
                    extends: vec![],
                    methods: vec![InterfaceMethod {
                        name: "count".into(),
                        default: true,
                        tags: vec![],
                    }],
                },
            ],
            classes: vec![base, posts],
        }
    }

    #[test]
    fn test_interfaces_are_inherited_transitively() {
        let registry = ClassRegistry::from_manifest(manifest()).unwrap();
        assert_eq!(
            registry.interfaces_of("Acme::Blog::PostRepository"),
            vec![
                "Acme::Persistence::Countable",
                "Acme::Persistence::RepositoryInterface"
            ]
        );
    }

    #[test]
    fn test_methods_of_reports_overrides_once() {
        let registry = ClassRegistry::from_manifest(manifest()).unwrap();
        let methods = registry.methods_of("Acme::Blog::PostRepository");
        let names: Vec<_> = methods
            .iter()
            .map(|m| (m.method.name.as_str(), m.declaring_class))
            .collect();
        assert_eq!(
            names,
            vec![
                ("add", "Acme::Blog::PostRepository"),
                ("find_recent", "Acme::Blog::PostRepository"),
                ("remove", "Acme::Persistence::Repository"),
            ]
        );
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut m = manifest();
        m.classes[1].parent = Some("Acme::Missing".into());
        let err = ClassRegistry::from_manifest(m).unwrap_err();
        assert!(matches!(err, AopError::Manifest { .. }));
    }

    #[test]
    fn test_cyclic_class_hierarchy_is_rejected() {
        let mut m = manifest();
        m.classes[0].parent = Some("Acme::Blog::PostRepository".into());
        let err = ClassRegistry::from_manifest(m).unwrap_err();
        assert!(err.to_string().contains("cyclic"));
    }

    #[test]
    fn test_interface_methods_include_inherited() {
        let registry = ClassRegistry::from_manifest(manifest()).unwrap();
        let methods = registry.interface_methods("Acme::Persistence::RepositoryInterface");
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].0, "Acme::Persistence::Countable");
        assert_eq!(methods[0].1.name, "count");
    }
}
