//! Rigscope - hardware analysis and live telemetry for your terminal
//!
//! Identifies the machine's components through layered probe chains and
//! renders a live dashboard of CPU, memory, storage, network, temperature
//! and connectivity.

mod config;
mod core;
mod format;
mod integrations;
mod probe;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::app::App;
use crate::probe::{HardwareIdentity, SharedRunner, SystemRunner};

#[derive(Parser)]
#[command(name = "rigscope")]
#[command(author = "Rigscope Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Hardware analysis and live telemetry dashboard for your terminal", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Metrics refresh interval in milliseconds
    #[arg(short, long, value_name = "MS")]
    interval: Option<u64>,

    /// Colour theme (graphite, tokyo-night, nord)
    #[arg(short, long, value_name = "NAME")]
    theme: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected hardware identity
    Hardware {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print a one-off metrics snapshot
    Snapshot {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Read the CPU temperature once
    Temp,

    /// Measure connectivity to the configured latency target
    Ping {
        /// Number of probes to send
        #[arg(short = 'n', long, default_value = "4")]
        count: u32,
    },

    /// Write a default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

fn setup_logging(verbosity: u8) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Stdout belongs to the TUI, so logs always go to a file
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rigscope")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "rigscope.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose)?;

    let mut config = config::Config::resolve(cli.config.as_deref())?;
    if let Some(interval) = cli.interval {
        config.general.refresh_interval_ms = interval;
    }
    if let Some(theme) = cli.theme {
        config.display.theme = theme;
    }

    let runner: SharedRunner = Arc::new(SystemRunner);

    match cli.command {
        Some(Commands::Hardware { json }) => {
            let identity =
                tokio::task::spawn_blocking(move || HardwareIdentity::detect(runner)).await?;
            probe::identity::print_identity(&identity, json)?;
        }
        Some(Commands::Snapshot { json }) => {
            let interval = Duration::from_millis(config.general.refresh_interval_ms.max(100));
            integrations::system::print_snapshot(interval, json).await?;
        }
        Some(Commands::Temp) => {
            tokio::task::spawn_blocking(move || probe::temperature::print_temperature(runner))
                .await?;
        }
        Some(Commands::Ping { count }) => {
            let latency = config.latency.clone();
            tokio::task::spawn_blocking(move || {
                integrations::latency::print_ping(&latency, count)
            })
            .await?;
        }
        Some(Commands::Init { force }) => {
            let path = cli
                .config
                .or_else(config::Config::default_path)
                .context("could not determine a configuration directory")?;
            config::init_config(&path, force)?;
        }
        None => {
            tracing::info!(theme = %config.display.theme, "starting dashboard");
            let mut app = App::new(config)?;
            app.run().await?;
        }
    }

    Ok(())
}
