use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Separator between namespace segments in class names (`Acme::Blog::Post`)
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Method visibility as declared in the class manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Parse a visibility keyword as used in `method(public Foo->bar())`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advice or pointcut declaration attached to a method of an aspect class
///
/// The expression is kept as a raw value so that a non-string expression in the manifest
/// is reported by the pointcut parser instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceDeclaration {
    Before(Value),
    After(Value),
    AfterReturning(Value),
    AfterThrowing(Value),
    Around(Value),
    /// Named pointcut; the method name becomes the pointcut name
    Pointcut(Value),
}

/// Interface introduction declared by an aspect class
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntroductionDeclaration {
    /// Fully qualified name of the introduced interface
    pub interface: String,
    /// Class-level pointcut expression selecting the classes that receive the interface
    pub pointcut: Value,
}

/// A method of a class
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Advice/pointcut declarations; only meaningful on aspect classes
    #[serde(default)]
    pub advice: Vec<AdviceDeclaration>,
}

impl MethodInfo {
    /// Plain public method without tags, used for synthetic entries
    pub fn synthetic(name: &str) -> Self {
        MethodInfo {
            name: name.to_string(),
            visibility: Visibility::Public,
            tags: Vec::new(),
            is_final: false,
            is_static: false,
            advice: Vec::new(),
        }
    }
}

/// A class as described by the manifest
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub introductions: Vec<IntroductionDeclaration>,
}

impl ClassInfo {
    /// Minimal class with only a name, convenient for building manifests in code
    pub fn named(name: impl Into<String>) -> Self {
        ClassInfo {
            name: name.into(),
            parent: None,
            interfaces: Vec::new(),
            tags: Vec::new(),
            is_final: false,
            methods: Vec::new(),
            introductions: Vec::new(),
        }
    }

    /// Last segment of the class name (`Post` for `Acme::Blog::Post`)
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// Namespace of the class (`Acme::Blog` for `Acme::Blog::Post`), empty for global classes
    pub fn namespace(&self) -> &str {
        match self.name.rfind(NAMESPACE_SEPARATOR) {
            Some(idx) => &self.name[..idx],
            None => "",
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A method declared by an interface
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterfaceMethod {
    pub name: String,
    /// Whether the introducing aspect provides a default implementation
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An interface as described by the manifest
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub methods: Vec<InterfaceMethod>,
}

/// Top-level manifest document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassManifest {
    #[serde(default)]
    pub interfaces: Vec<InterfaceInfo>,
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
}

/// Last `::`-separated segment of a name
pub fn short_name(name: &str) -> &str {
    match name.rfind(NAMESPACE_SEPARATOR) {
        Some(idx) => &name[idx + NAMESPACE_SEPARATOR.len()..],
        None => name,
    }
}
