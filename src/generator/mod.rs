//! # Generator Module
//!
//! Renders the proxies of a weave as Rust source, for consumers that want to inspect or compile
//! them ahead of time instead of only using the runtime [`ProxyFactory`](crate::ProxyFactory).
//!
//! ## Generated Structure
//!
//! ```text
//! out_dir/
//! ├── mod.rs                                   # `pub mod` per proxy
//! └── acme_blog_post_repository_aop_proxy.rs   # one file per proxy class
//! ```
//!
//! Each proxy module carries the target and proxy class names, the introduced interfaces, the
//! advice table of every advised method and a typed facade struct whose methods forward to
//! [`ProxyObject::call`](crate::ProxyObject::call).
//!
//! Existing proxy modules are left alone unless `force` is set; `mod.rs` is always rewritten.
//! With `dry_run` nothing is written and the returned list tells what would be.

mod templates;

use anyhow::Context;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::reflection::short_name;
use crate::weaver::WeaverContext;

pub use templates::{render_proxy_module, AdviceView, MethodView, ProxyTemplateData};

/// What happened to one output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    /// Existing file kept because `force` was not set
    Skipped,
    /// Would have been written
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub status: WriteStatus,
}

/// Write one module per proxy of `context` plus a `mod.rs` into `out_dir`
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or a file cannot be rendered or
/// written
pub fn write_proxy_modules(
    context: &WeaverContext,
    out_dir: &Path,
    force: bool,
    dry_run: bool,
) -> anyhow::Result<Vec<GeneratedFile>> {
    if !dry_run {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;
    }

    let mut files = Vec::new();
    let mut modules = Vec::new();
    let mut taken = HashSet::new();
    for spec in context.proxies() {
        let module = unique_name(module_name(&spec.proxy_class), &mut taken);
        let path = out_dir.join(format!("{}.rs", module));
        modules.push(module);

        let status = if dry_run {
            WriteStatus::DryRun
        } else if path.exists() && !force {
            warn!(path = ?path, "Skipping existing proxy module");
            WriteStatus::Skipped
        } else {
            templates::write_proxy_rs(&path, spec, context.generation())
                .with_context(|| format!("Failed to write proxy module {:?}", path))?;
            WriteStatus::Written
        };
        files.push(GeneratedFile { path, status });
    }

    let mod_rs = out_dir.join("mod.rs");
    let status = if dry_run {
        WriteStatus::DryRun
    } else {
        templates::write_mod_rs(out_dir, &modules)
            .with_context(|| format!("Failed to write {:?}", mod_rs))?;
        WriteStatus::Written
    };
    files.push(GeneratedFile {
        path: mod_rs,
        status,
    });

    info!(
        out_dir = ?out_dir,
        proxies = modules.len(),
        dry_run,
        "Proxy modules generated"
    );
    Ok(files)
}

/// Module file stem of a proxy class
///
/// `Acme::Blog::PostAopProxy_v2` becomes `acme_blog_post_aop_proxy_v2`.
pub fn module_name(proxy_class: &str) -> String {
    proxy_class
        .split("::")
        .filter(|segment| !segment.is_empty())
        .map(to_snake_case)
        .collect::<Vec<_>>()
        .join("_")
}

/// Facade struct name of a proxy class (`PostAopProxy_v2` → `PostAopProxyV2`)
pub(crate) fn struct_name(proxy_class: &str) -> String {
    short_name(proxy_class)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Rust identifier of a facade method
///
/// Facade helpers and keywords that cannot be raw identifiers get a `call_` prefix.
pub(crate) fn fn_name(method: &str) -> String {
    let name = to_snake_case(method);
    if matches!(
        name.as_str(),
        "" | "instantiate" | "object" | "self" | "super" | "crate"
    ) {
        format!("call_{}", name)
    } else if RUST_KEYWORDS.contains(&name.as_str()) {
        format!("r#{}", name)
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", name)
    } else {
        name
    }
}

/// `name`, or `name_2`, `name_3`, ... if already taken; the result is marked as taken
pub(crate) fn unique_name(name: String, taken: &mut HashSet<String>) -> String {
    let mut candidate = name.clone();
    let mut version = 1;
    while taken.contains(&candidate) {
        version += 1;
        candidate = format!("{}_{}", name, version);
    }
    taken.insert(candidate.clone());
    candidate
}

fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out
}
