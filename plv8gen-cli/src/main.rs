//! plv8gen CLI - wraps compiled TypeScript functions in PL/v8 definitions

// Global invariants enforced:
// - Deterministic processing order
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use clap::Parser;
use plv8gen_core::{config, convert_tree, ConversionSummary};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "plv8gen")]
#[command(about = "Generate PL/v8 create-function statements from compiled TypeScript functions")]
#[command(version)]
struct Cli {
    /// Add drop statements
    #[arg(short, long)]
    drop: bool,

    /// Function root directory (overrides config file, default: build/src/functions)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Path to config file (default: auto-discover)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory levels to scan below the root (overrides config file)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let project_root = std::env::current_dir()?;
    let mut resolved = config::load_and_resolve(&project_root, cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(config_path) = &resolved.config_path {
        tracing::info!("Using config: {}", config_path.display());
    }

    // CLI flags override config file values
    if let Some(root) = cli.root {
        resolved.root = if root.is_relative() {
            project_root.join(root)
        } else {
            root
        };
    }
    if let Some(max_depth) = cli.max_depth {
        if max_depth == 0 {
            anyhow::bail!("--max-depth must be at least 1");
        }
        resolved.max_depth = max_depth;
    }
    resolved.drop |= cli.drop;

    let summary = convert_tree(&resolved)?;
    report_summary(&summary);

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Log the run outcome; failures are repeated so they are not lost in progress output
fn report_summary(summary: &ConversionSummary) {
    tracing::info!("Converted {} function(s)", summary.converted.len());
    if summary.failed.is_empty() {
        return;
    }

    tracing::warn!("Skipped {} function(s) due to errors:", summary.failed.len());
    for failed in &summary.failed {
        tracing::warn!("  {}: {}", failed.unit.stem.display(), failed.error);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
