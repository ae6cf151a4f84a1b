// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Wattbill CLI - electricity usage reports from the O&R customer portal.
//!
//! # Examples
//!
//! ```bash
//! # Produce a report if a new billing interval is available
//! wattbill run
//!
//! # Ignore the day-count gating
//! wattbill run --force
//!
//! # Fetch and print without persisting the billing date
//! wattbill run --dry-run --format json
//!
//! # Inspect the settings file
//! wattbill config show
//! ```

mod report;
mod reporter;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use reporter::RunOutcome;
use settings::Settings;

// ============================================================================
// CLI Definition
// ============================================================================

/// Wattbill CLI - electricity usage reports.
#[derive(Parser)]
#[command(name = "wattbill")]
#[command(about = "Electricity usage reports from the O&R customer portal")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'run' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Settings file path (defaults to the user config directory).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch usage and produce a report (default).
    Run(RunArgs),

    /// Manage settings.
    Config(ConfigArgs),
}

/// Arguments for the run command.
#[derive(clap::Args, Default)]
pub struct RunArgs {
    /// Run even if too few days have passed since the last report.
    #[arg(long)]
    pub force: bool,

    /// Do not persist the new billing date after reporting.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the config command.
#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active settings.
    Show,
    /// Print the settings file path.
    Path,
    /// Write a settings file with the given username.
    Init {
        /// Portal account username (email address).
        #[arg(long)]
        username: String,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("wattbill=debug,info")
    } else {
        EnvFilter::new("wattbill=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Run(args)) => run_report(args, &cli).await,
        Some(Commands::Config(args)) => run_config(args, &cli),
        None => run_report(&RunArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn settings_path(cli: &Cli) -> PathBuf {
    cli.settings.clone().unwrap_or_else(Settings::default_path)
}

/// Runs the reporter and prints the outcome.
async fn run_report(args: &RunArgs, cli: &Cli) -> Result<()> {
    let path = settings_path(cli);
    let mut settings = Settings::load_from(&path)?;

    if settings.username.is_empty() {
        anyhow::bail!(
            "no portal username configured; run `wattbill config init --username <email>` first"
        );
    }

    let outcome = reporter::run(&mut settings, args.force, args.dry_run).await?;

    match outcome {
        RunOutcome::Reported(usage_report) => {
            if !args.dry_run {
                settings.save_to(&path)?;
            }
            match cli.format {
                OutputFormat::Text => {
                    println!("{}", report::subject(&usage_report));
                    println!();
                    println!("{}", report::body_text(&usage_report));
                }
                OutputFormat::Json => {
                    println!("{}", report::to_json(&usage_report, true)?);
                }
            }
        }
        RunOutcome::TooSoon { last_report } => {
            if !cli.quiet {
                eprintln!("Last report was {last_report}; nothing to do yet");
            }
        }
        RunOutcome::AlreadyReported { billing_date } => {
            if !cli.quiet {
                eprintln!("Billing date {billing_date} was already reported");
            }
        }
    }

    Ok(())
}

/// Runs a config subcommand.
fn run_config(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    let path = settings_path(cli);

    match &args.action {
        ConfigAction::Show => {
            let settings = Settings::load_from(&path)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Init { username } => {
            let settings = Settings {
                username: username.clone(),
                ..Settings::default()
            };
            settings.save_to(&path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
