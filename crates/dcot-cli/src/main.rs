//! # dcot CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber and
//! dispatches to the subcommand handlers in `dcot_cli`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dcot_cli::inspect::{run_events, run_history, HistoryArgs};
use dcot_cli::invoke::{run_invoke, InvokeArgs};
use dcot_cli::ledger::{run_init, InitArgs};
use dcot_cli::{load_config, DEFAULT_LEDGER_PATH};

/// Digital chain of custody.
///
/// Runs custody transitions against a local ledger snapshot.
#[derive(Parser, Debug)]
#[command(name = "dcot", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the ledger snapshot.
    #[arg(long, global = true, default_value = DEFAULT_LEDGER_PATH)]
    ledger: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty ledger snapshot.
    Init(InitArgs),

    /// Submit a transaction and commit it on success.
    Invoke(InvokeArgs),

    /// Evaluate a transaction without committing.
    Query(InvokeArgs),

    /// Show the raw version history of an asset.
    History(HistoryArgs),

    /// List committed chaincode events.
    Events,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(ledger = %cli.ledger.display(), "dcot CLI starting");

    let result = match cli.command {
        Commands::Init(args) => run_init(&args, &cli.ledger),
        Commands::Invoke(args) => load_config(cli.config.as_deref())
            .and_then(|config| run_invoke(&args, &config, &cli.ledger, true)),
        Commands::Query(args) => load_config(cli.config.as_deref())
            .and_then(|config| run_invoke(&args, &config, &cli.ledger, false)),
        Commands::History(args) => run_history(&args, &cli.ledger),
        Commands::Events => run_events(&cli.ledger),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
