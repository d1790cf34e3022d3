//! Shipway - artifact deployment
//!
//! Usage:
//!   shipway deploy                 # Deploy every set in shipway.toml
//!   shipway check                  # Check configured sources without deploying
//!   shipway check-path --root DIR --path REL
//!   shipway digest FILE [--register]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shipway_core::commands::{
    DeployCommand, DeployOptions, DeployReport, PathCheck, SourceCheck, check_local_path,
    check_sources, digest_file, register_file,
};
use shipway_core::context::AppContext;
use shipway_core::engine::{CancellationToken, FingerprintStore};
use shipway_core::source::{FormValidation, Origin};

#[derive(Parser)]
#[command(name = "shipway")]
#[command(about = "Deploy build artifacts from a workspace or an archived run", long_about = None)]
struct Cli {
    /// Path to shipway.toml (default: ./shipway.toml, then the user config dir)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy every deployment set of the configured run
    Deploy {
        /// Origins to resolve artifacts from (workspace, archived-run)
        ///
        /// Overrides build.origins; `--origins archived-run` redeploys a
        /// finished run from its archive only.
        #[arg(long, value_delimiter = ',')]
        origins: Vec<Origin>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Check every configured source against its roots without deploying
    Check {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Check whether a relative path stays inside a root directory
    CheckPath {
        /// Trusted root directory
        #[arg(long)]
        root: PathBuf,
        /// Path relative to the root
        #[arg(long)]
        path: PathBuf,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the digest of a file
    Digest {
        file: PathBuf,
        /// Create a fingerprint record for the file
        #[arg(long)]
        register: bool,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shipway=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut ctx = AppContext::with_defaults()?;
    if let Some(path) = cli.config {
        ctx = ctx.with_config_path(path);
    }

    match cli.command {
        Commands::Deploy { origins, format } => run_deploy(ctx, origins, format),
        Commands::Check { format } => run_check(&ctx, format),
        Commands::CheckPath { root, path, format } => run_check_path(root, path, format),
        Commands::Digest { file, register } => run_digest(&ctx, file, register),
    }
}

fn run_deploy(ctx: AppContext, origins: Vec<Origin>, format: OutputFormat) -> Result<()> {
    let mut options = DeployOptions::new();
    if !origins.is_empty() {
        options = options.with_origins(origins);
    }

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone())?;
    let report = DeployCommand::new(ctx).run(&options, &cancel)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_deploy_report(&report),
    }
    Ok(())
}

/// Trip `cancel` on the first Ctrl-C so the pass stops at the next target or
/// file and the run record is still written. A second Ctrl-C exits at once.
fn cancel_on_ctrl_c(cancel: CancellationToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the interrupt watcher")?;
    std::thread::spawn(move || {
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::warn!("Interrupted, stopping after the current step");
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    });
    Ok(())
}

fn print_deploy_report(report: &DeployReport) {
    println!("Run {}", report.run_id);
    for set in &report.sets {
        println!();
        println!("{}", set.host);
        println!("  {:<20} {:<14} {:<50} DIGEST", "TARGET", "ORIGIN", "DEPLOYED TO");
        for target in &set.reports {
            let origin = target
                .artifact
                .as_ref()
                .map(|a| a.origin.as_str())
                .unwrap_or("-");
            let location = match (&target.location, target.recorded) {
                (Some(location), true) => location.to_string(),
                (Some(location), false) => format!("{} (already recorded)", location),
                (None, _) => "nothing deployed".to_string(),
            };
            let digest = target
                .digest
                .as_ref()
                .map(|d| short_digest(d.as_str()))
                .unwrap_or("-");
            println!(
                "  {:<20} {:<14} {:<50} {}",
                target.target, origin, location, digest
            );
        }
    }
    println!();
    println!("{} application(s) recorded for this run", report.run.len());
}

fn short_digest(hex: &str) -> &str {
    &hex[..hex.len().min(12)]
}

fn run_check(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let store = ctx.config_store();
    let config = store.load()?;
    let checks = check_sources(&config, &store.base_dir());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&checks)?),
        OutputFormat::Table => print_source_checks(&checks),
    }
    if checks.iter().any(|c| c.result.is_error()) {
        std::process::exit(1);
    }
    Ok(())
}

fn print_source_checks(checks: &[SourceCheck]) {
    if checks.is_empty() {
        println!("No targets configured");
        return;
    }
    for check in checks {
        let (status, message) = match &check.result {
            FormValidation::Ok => ("ok", String::new()),
            FormValidation::Warning(msg) => ("warning", msg.clone()),
            FormValidation::Error(msg) => ("error", msg.clone()),
        };
        println!(
            "{:<12} {:<20} {:<14} {:<8} {}",
            check.host,
            check.target,
            check.origin.as_str(),
            status,
            message
        );
    }
}

fn run_check_path(root: PathBuf, path: PathBuf, format: OutputFormat) -> Result<()> {
    let check = check_local_path(&root, &path);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&check)?),
        OutputFormat::Table => print_path_check(&check),
    }
    if !check.contained {
        std::process::exit(1);
    }
    Ok(())
}

fn print_path_check(check: &PathCheck) {
    let verdict = if check.contained {
        "contained"
    } else {
        "NOT contained"
    };
    println!(
        "{} -> {} is {} within {}",
        check.candidate.display(),
        check.resolved.display(),
        verdict,
        check.root.display()
    );
}

fn run_digest(ctx: &AppContext, file: PathBuf, register: bool) -> Result<()> {
    if !register {
        match digest_file(&file)? {
            Some(digest) => println!("{}  {}", digest, file.display()),
            None => println!("no digest  {} (not a regular file)", file.display()),
        }
        return Ok(());
    }

    let store = ctx.config_store();
    let fingerprints = if store.exists() {
        ctx.fingerprint_store(&store.load()?)
    } else {
        FingerprintStore::new(ctx.state_dir().join("fingerprints"))
    };
    match register_file(&fingerprints, &file)? {
        Some(record) => println!(
            "{}  {} (registered in {})",
            record.digest,
            file.display(),
            fingerprints.dir().display()
        ),
        None => println!("no digest  {} (not a regular file)", file.display()),
    }
    Ok(())
}
