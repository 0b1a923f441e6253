use crate::aspect::AdviceKind;
use crate::config::WeaverConfig;
use crate::generator::{write_proxy_modules, WriteStatus};
use crate::reflection::load_manifest;
use crate::runtime::ObjectRegistry;
use crate::settings::Settings;
use crate::telemetry::{init_logging, LogConfig};
use crate::weaver::{MethodPlan, Weaver, WeaverContext};
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line interface of the aopweave weaver
#[derive(Parser)]
#[command(name = "aopweave")]
#[command(about = "Pointcut matching and proxy weaving for class manifests", long_about = None)]
pub struct Cli {
    /// Log at debug level with source locations
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs shared by every command
#[derive(Args, Debug, Clone)]
pub struct WeaveInputs {
    /// Class manifest (YAML or JSON)
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Application settings consulted by setting(...) pointcuts
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Weaver configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Weave the manifest and report errors without writing anything
    Check {
        #[command(flatten)]
        inputs: WeaveInputs,
    },
    /// Show the intercepted methods and advice of one class
    Explain {
        #[command(flatten)]
        inputs: WeaveInputs,

        /// Fully qualified class name
        #[arg(long)]
        class: String,
    },
    /// Generate proxy modules from the weave
    Generate {
        #[command(flatten)]
        inputs: WeaveInputs,

        /// Output directory for the generated modules
        #[arg(short, long)]
        output: PathBuf,

        /// Overwrite existing proxy modules
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Show what would be written without writing files
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

/// Run a parsed command line
///
/// # Errors
///
/// Returns an error if loading an input, weaving or writing output fails
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::from_env()
    };
    // A subscriber installed by the embedding process wins.
    if init_logging(&log_config).is_err() {
        tracing::debug!("Global subscriber already installed");
    }

    match &cli.command {
        Commands::Check { inputs } => {
            let context = weave_inputs(inputs)?;
            print!("{}", summarize(&context));
            Ok(())
        }
        Commands::Explain { inputs, class } => {
            let context = weave_inputs(inputs)?;
            print!("{}", explain_class(&context, class)?);
            Ok(())
        }
        Commands::Generate {
            inputs,
            output,
            force,
            dry_run,
        } => {
            let context = weave_inputs(inputs)?;
            let files = write_proxy_modules(&context, output, *force, *dry_run)?;
            for file in files {
                match file.status {
                    WriteStatus::Written => println!("✅ Generated {:?}", file.path),
                    WriteStatus::Skipped => {
                        println!("⚠️  Skipping existing file: {:?}", file.path)
                    }
                    WriteStatus::DryRun => println!("📝 Would write {:?}", file.path),
                }
            }
            Ok(())
        }
    }
}

/// Load manifest, settings and config, then weave
///
/// Custom `filter(...)` pointcuts cannot be resolved from the command line and fail the weave.
pub fn weave_inputs(inputs: &WeaveInputs) -> anyhow::Result<Arc<WeaverContext>> {
    let config = WeaverConfig::load(inputs.config.as_deref())?;
    let classes = load_manifest(&inputs.manifest)?;
    let settings = match &inputs.settings {
        Some(path) => Settings::from_yaml_file(path)?,
        None => Settings::default(),
    };
    let context = Weaver::new(config)
        .weave(classes, settings, &ObjectRegistry::new())
        .with_context(|| format!("Weaving {} failed", inputs.manifest.display()))?;
    Ok(context)
}

/// One-screen report of a weave
pub fn summarize(context: &WeaverContext) -> String {
    let mut lines = vec![format!(
        "✅ Weave OK: {} aspect(s), {} target class(es), {} proxy(ies)",
        context.aspects().containers().len(),
        context.interceptions().count(),
        context.proxies().count()
    )];
    for spec in context.proxies() {
        lines.push(format!(
            "  {} -> {} ({} advised method(s))",
            spec.target_class,
            spec.proxy_class,
            spec.advised_methods().count()
        ));
    }
    lines.join("\n") + "\n"
}

/// Intercepted methods map of one class, with the advice of each method in execution order
///
/// # Errors
///
/// Returns an error if the class is not a weave target
pub fn explain_class(context: &WeaverContext, class_name: &str) -> anyhow::Result<String> {
    let Some(interception) = context.interception(class_name) else {
        bail!("class {} is not a weave target", class_name);
    };
    let Some(spec) = context.proxy_for(class_name) else {
        return Ok(format!("{} is not woven\n", class_name));
    };

    let mut lines = vec![format!("{} -> {}", class_name, spec.proxy_class)];
    for introduced in &interception.introduced_interfaces {
        lines.push(format!(
            "  introduces {} (from {})",
            introduced.interface, introduced.aspect_class
        ));
    }
    for method in &spec.methods {
        let plan = match &method.plan {
            MethodPlan::Passthrough => "passthrough",
            MethodPlan::Advised => "advised",
            MethodPlan::Introduced { .. } => "introduced",
        };
        lines.push(format!(
            "  {} [{}] declared by {}",
            method.name, plan, method.declaring_class
        ));
        for kind in AdviceKind::ALL {
            for advice in method.advices(kind) {
                lines.push(format!(
                    "    {:<15} {}::{}",
                    kind.as_str(),
                    advice.aspect_class,
                    advice.method
                ));
            }
        }
    }
    Ok(lines.join("\n") + "\n")
}
