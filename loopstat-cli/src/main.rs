//! Loopstat CLI - simulated multi-host statistics runs.
//!
//! This is the main entry point for the loopstat CLI application.
//! It uses clap for argument parsing and dispatches to the appropriate
//! command handler based on user input.

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use loopstat_runtime::ReportFormat;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{run_config, run_demo, ConfigArgs, DemoArgs};
use config::Config;
use error::CliError;

/// Loopstat - per-thread loop statistics, gathered across hosts
///
/// Runs a simulated cluster that records loop statistics on every worker
/// thread of every host and gathers them into one report on host 0.
#[derive(Parser, Debug)]
#[command(name = "loopstat")]
#[command(author = "Loopstat Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Per-thread loop statistics, gathered across hosts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "LOOPSTAT_VERBOSE")]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "LOOPSTAT_CONFIG")]
    config: Option<PathBuf>,

    /// Disable color output
    #[arg(long, global = true, env = "LOOPSTAT_NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the loopstat CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate a multi-host run and print the gathered report
    ///
    /// Every host runs a worker pool that records iteration counts, timings,
    /// ratios and modes, then all hosts report to host 0.
    Demo(DemoCommand),

    /// Print or write the effective configuration
    Config(ConfigCommand),
}

/// Arguments for the demo subcommand.
#[derive(Parser, Debug)]
struct DemoCommand {
    /// Number of hosts, sink included (default: from config)
    #[arg(short = 'H', long)]
    hosts: Option<u32>,

    /// Worker threads per host (default: from config)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Distinct loop names (default: from config)
    #[arg(short, long)]
    loops: Option<usize>,

    /// Instances of each loop (default: from config)
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Report format: tabular, structured or records
    #[arg(short = 'F', long)]
    format: Option<ReportFormat>,

    /// Sink's wait for peers in milliseconds, 0 waits forever
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Host that never sends its report
    #[arg(long)]
    drop_host: Option<u32>,

    /// Exit with an error if the report is partial
    #[arg(long)]
    strict: bool,
}

/// Arguments for the config subcommand.
#[derive(Parser, Debug)]
struct ConfigCommand {
    /// Write the configuration to this path
    #[arg(short, long)]
    write: Option<PathBuf>,

    /// Print JSON instead of TOML
    #[arg(long)]
    json: bool,
}

/// Main entry point for the loopstat CLI.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color).context("initializing logging")?;

    let config = load_config(cli.config.as_deref()).context("loading configuration")?;

    execute_command(cli.command, cli.verbose, config)
}

/// Initialize the logging system.
///
/// Library crates log through `log`; the subscriber's `log` bridge picks
/// those records up. Output goes to stderr so reports on stdout stay clean.
fn init_logging(verbose: bool, no_color: bool) -> Result<(), CliError> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(verbose);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| CliError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config, CliError> {
    match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

/// Execute the selected command.
fn execute_command(command: Commands, verbose: bool, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Demo(args) => execute_demo(args, verbose, config),
        Commands::Config(args) => execute_config(args, config),
    }
}

/// Execute the demo command.
fn execute_demo(args: DemoCommand, verbose: bool, config: Config) -> anyhow::Result<()> {
    let demo_args = DemoArgs {
        hosts: args.hosts.unwrap_or(config.demo.hosts),
        threads: args.threads.unwrap_or(config.collector.threads),
        loops: args.loops.unwrap_or(config.demo.loops),
        iterations: args.iterations.unwrap_or(config.demo.iterations),
        format: args.format.unwrap_or(config.collector.format),
        timeout_ms: args.timeout_ms.unwrap_or(config.collector.gather_timeout_ms),
        output: args.output,
        drop_host: args.drop_host,
        strict: args.strict,
    };

    let outcome = run_demo(&demo_args, &config.collector).context("demo run failed")?;

    if verbose {
        tracing::info!(
            received = ?outcome.summary.received_from,
            missing = ?outcome.summary.missing,
            duplicates = outcome.summary.duplicates,
            "gathered {} of {} peer reports in {:.2}s",
            outcome.summary.received_from.len(),
            outcome.summary.initial_pending,
            outcome.elapsed.as_secs_f64()
        );
    }
    Ok(())
}

/// Execute the config command.
fn execute_config(args: ConfigCommand, config: Config) -> anyhow::Result<()> {
    let config_args = ConfigArgs {
        write: args.write,
        json: args.json,
    };
    let stdout = std::io::stdout();
    run_config(config_args, &config, &mut stdout.lock()).context("config command failed")?;
    Ok(())
}
