use askama::Template;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::{fn_name, struct_name, unique_name};
use crate::aspect::AdviceKind;
use crate::weaver::{MethodPlan, ProxySpec, CONSTRUCTOR};

/// One advice line of a generated proxy module
#[derive(Debug, Clone)]
pub struct AdviceView {
    pub method: String,
    pub kind: &'static str,
    /// `Aspect::method` of the handler
    pub handler: String,
}

/// One facade method of a generated proxy module
#[derive(Debug, Clone)]
pub struct MethodView {
    /// Method name as called on the proxy object
    pub name: String,
    /// Rust identifier of the facade method
    pub fn_name: String,
    /// Human-readable dispatch plan
    pub plan: String,
}

/// Template data for one proxy module
#[derive(Template)]
#[template(path = "proxy.rs.txt", escape = "none")]
pub struct ProxyTemplateData {
    pub generation: u64,
    pub target_class: String,
    pub proxy_class: String,
    pub struct_name: String,
    pub introduced_interfaces: Vec<String>,
    pub advice: Vec<AdviceView>,
    pub methods: Vec<MethodView>,
}

impl ProxyTemplateData {
    pub fn from_spec(spec: &ProxySpec, generation: u64) -> Self {
        let mut advice = Vec::new();
        for method in spec.advised_methods() {
            for kind in AdviceKind::ALL {
                for a in method.advices(kind) {
                    advice.push(AdviceView {
                        method: method.name.clone(),
                        kind: kind.as_str(),
                        handler: format!("{}::{}", a.aspect_class, a.method),
                    });
                }
            }
        }

        let mut taken = HashSet::new();
        let methods = spec
            .methods
            .iter()
            .filter(|m| m.name != CONSTRUCTOR)
            .map(|m| MethodView {
                name: m.name.clone(),
                fn_name: unique_name(fn_name(&m.name), &mut taken),
                plan: match &m.plan {
                    MethodPlan::Passthrough => "passthrough".to_string(),
                    MethodPlan::Advised => "advised".to_string(),
                    MethodPlan::Introduced { interface, .. } => {
                        format!("introduced by {}", interface)
                    }
                },
            })
            .collect();

        ProxyTemplateData {
            generation,
            target_class: spec.target_class.clone(),
            proxy_class: spec.proxy_class.clone(),
            struct_name: struct_name(&spec.proxy_class),
            introduced_interfaces: spec
                .introduced_interfaces
                .iter()
                .map(|i| i.interface.clone())
                .collect(),
            advice,
            methods,
        }
    }
}

/// Template data for the `mod.rs` listing all proxy modules
#[derive(Template)]
#[template(path = "mod.rs.txt", escape = "none")]
pub struct ModRsTemplateData {
    pub modules: Vec<String>,
}

/// Render the source of one proxy module
///
/// # Errors
///
/// Returns an error if template rendering fails
pub fn render_proxy_module(spec: &ProxySpec, generation: u64) -> anyhow::Result<String> {
    Ok(ProxyTemplateData::from_spec(spec, generation).render()?)
}

/// Write one proxy module file
///
/// # Errors
///
/// Returns an error if template rendering or file writing fails
pub(crate) fn write_proxy_rs(path: &Path, spec: &ProxySpec, generation: u64) -> anyhow::Result<()> {
    let rendered = render_proxy_module(spec, generation)?;
    fs::write(path, rendered)?;
    Ok(())
}

/// Write the `mod.rs` declaring every proxy module
///
/// # Errors
///
/// Returns an error if template rendering or file writing fails
pub(crate) fn write_mod_rs(dir: &Path, modules: &[String]) -> anyhow::Result<()> {
    let rendered = ModRsTemplateData {
        modules: modules.to_vec(),
    }
    .render()?;
    fs::write(dir.join("mod.rs"), rendered)?;
    Ok(())
}
