//! Accord-Harvest main entry point
//!
//! This is the command-line interface for the Accord-Harvest catalogue harvester.

use accord_harvest::config::{load_effective_config, Config};
use accord_harvest::crawler::{Coordinator, HaltReason, PhaseOutcome, PhaseReport};
use accord_harvest::output::{load_statistics, print_phase_report, print_statistics};
use accord_harvest::storage::{open_storage, Storage};
use accord_harvest::HarvestError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for a run stopped early by a rate-limit signal
const EXIT_HALTED: u8 = 3;

/// Exit code for a run stopped by Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// Accord-Harvest: a resumable catalogue harvester
///
/// Collects item URLs from every designer listed on the index page, then extracts
/// each item's name and weighted accords into a local SQLite store. Every phase can
/// be stopped and re-run; work already stored is never repeated.
#[derive(Parser, Debug)]
#[command(name = "accord-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable catalogue harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults plus HARVEST_* variables if omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Phase A: collect candidate item URLs from category pages
    Discover {
        /// Ignore stored URLs and exhaustion markers when deciding what to visit
        #[arg(long)]
        fresh: bool,
    },

    /// Phase B: extract every candidate URL not extracted yet
    Extract,

    /// Run discovery, then extraction
    Run {
        /// Ignore stored URLs and exhaustion markers during discovery
        #[arg(long)]
        fresh: bool,
    },

    /// Show statistics from the database and exit
    Stats,

    /// Delete stored records
    Reset {
        /// Delete candidate URLs
        #[arg(long)]
        urls: bool,

        /// Delete extracted items
        #[arg(long)]
        items: bool,

        /// Delete everything
        #[arg(long, conflicts_with_all = ["urls", "items"])]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Discover { fresh } => {
            handle_phases(config, |mut coordinator| async move {
                let report = coordinator.discover_urls(fresh).await?;
                Ok(vec![report])
            })
            .await
        }
        Command::Extract => {
            handle_phases(config, |mut coordinator| async move {
                let report = coordinator.extract_items().await?;
                Ok(vec![report])
            })
            .await
        }
        Command::Run { fresh } => {
            handle_phases(config, |mut coordinator| async move {
                coordinator.run_all(fresh).await
            })
            .await
        }
        Command::Stats => handle_stats(&config).map(|_| ExitCode::SUCCESS),
        Command::Reset { urls, items, all } => {
            handle_reset(&config, urls || all, items || all).map(|_| ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("accord_harvest=info,warn"),
            1 => EnvFilter::new("accord_harvest=debug,info"),
            2 => EnvFilter::new("accord_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(path: Option<&std::path::Path>) -> Result<Config, HarvestError> {
    match path {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults and environment"),
    }

    let (config, hash) = load_effective_config(path)?;
    if let Some(hash) = hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }
    tracing::info!(
        "Store: {}, cap {} per category, concurrency {}",
        if config.store.is_in_memory() {
            ":memory:".to_string()
        } else {
            config.store.database_path().display().to_string()
        },
        config.crawler.per_category_cap,
        config.crawler.concurrency
    );

    Ok(config)
}

/// Opens the store, installs the Ctrl-C handler and runs the requested phases
async fn handle_phases<F, Fut>(config: Config, phases: F) -> Result<ExitCode, HarvestError>
where
    F: FnOnce(Coordinator) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<PhaseReport>, HarvestError>>,
{
    let coordinator = Coordinator::new(config)?;

    let governor = coordinator.governor();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            governor.halt(HaltReason::Interrupted);
        }
    });

    let reports = phases(coordinator).await?;
    for report in &reports {
        print_phase_report(report);
    }

    Ok(exit_code(&reports))
}

/// Maps phase outcomes to the process exit code
fn exit_code(reports: &[PhaseReport]) -> ExitCode {
    let halt = reports.iter().find_map(|report| match report.outcome {
        PhaseOutcome::Halted(reason) => Some(reason),
        PhaseOutcome::Done => None,
    });

    match halt {
        None => ExitCode::SUCCESS,
        Some(HaltReason::RateLimited) => ExitCode::from(EXIT_HALTED),
        Some(HaltReason::Interrupted) => ExitCode::from(EXIT_INTERRUPTED),
    }
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), HarvestError> {
    let storage = open_storage(&config.store)?;
    let stats = load_statistics(&storage, config.crawler.per_category_cap)?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the reset command
fn handle_reset(config: &Config, urls: bool, items: bool) -> Result<(), HarvestError> {
    if !urls && !items {
        println!("Nothing to reset: pass --urls, --items or --all");
        return Ok(());
    }

    let mut storage = open_storage(&config.store)?;

    if items {
        let removed = storage.reset_items()?;
        tracing::info!("Removed {} extracted items", removed);
        println!("Removed {} extracted items", removed);
    }
    if urls {
        let removed = storage.reset_urls()?;
        tracing::info!("Removed {} candidate URLs", removed);
        println!("Removed {} candidate URLs", removed);
    }

    Ok(())
}
