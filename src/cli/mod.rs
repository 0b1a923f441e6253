//! # CLI Module
//!
//! Command-line access to the weaver for build scripts and CI.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Parse every pointcut and weave the manifest, reporting the proxies that would be built:
//!
//! ```bash
//! aopweave check --manifest classes.yaml --settings settings.yaml
//! ```
//!
//! ### `explain`
//!
//! Print the intercepted methods map of one class with its advice in execution order:
//!
//! ```bash
//! aopweave explain --manifest classes.yaml --class Acme::Blog::PostRepository
//! ```
//!
//! ### `generate`
//!
//! Render one Rust module per proxy into a directory:
//!
//! ```bash
//! aopweave generate --manifest classes.yaml --output src/proxies --force
//! ```
//!
//! All commands accept `--config` (weaver configuration YAML) and `--verbose`.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use aopweave::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{explain_class, run_cli, summarize, weave_inputs, Cli, Commands, WeaveInputs};
