//! # Reflection Module
//!
//! The weaver needs to know which classes exist, what they extend and implement, which tags
//! they carry and which methods they declare. A class manifest (YAML or JSON) describes all of
//! this, and [`ClassRegistry`] answers the questions the matching engine asks about it.
//!
//! ```rust,ignore
//! use aopweave::reflection::load_manifest;
//!
//! let registry = load_manifest("app/classes.yaml")?;
//! for class in registry.classes() {
//!     println!("{} implements {:?}", class.name, registry.interfaces_of(&class.name));
//! }
//! ```

mod load;
mod model;
mod registry;

pub use load::{load_manifest, parse_manifest};
pub use model::{
    short_name, AdviceDeclaration, ClassInfo, ClassManifest, InterfaceInfo, InterfaceMethod,
    IntroductionDeclaration, MethodInfo, Visibility, NAMESPACE_SEPARATOR,
};
pub use registry::{ClassMethod, ClassRegistry};
