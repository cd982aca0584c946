//! Docket - meeting notes to action items and calendar reminders
//!
//! Main entry point for the Docket CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

mod commands;

use commands::{ask, meetings, process, serve, status};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Docket - turn meeting notes into action items and calendar reminders
#[derive(Parser)]
#[command(name = "docket")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to config file (overrides default discovery)
    #[arg(long, global = true, env = "DOCKET_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch a messaging channel and process incoming notes and questions
    Serve(serve::ServeArgs),

    /// Process meeting notes from a file or stdin
    Process(process::ProcessArgs),

    /// Ask a question about past meetings
    Ask(ask::AskArgs),

    /// Show backend health and store statistics
    Status(status::StatusArgs),

    /// Browse stored meetings and action items
    Meetings(meetings::MeetingsArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

const LOG_TARGETS: &[&str] = &[
    "docket",
    "docket_domain",
    "docket_llm",
    "docket_index",
    "docket_store",
    "docket_reminders",
    "docket_channel",
    "docket_config",
];

/// `target=level` for every workspace crate, then `rest` for everything else.
fn directives(level: &str, rest: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .chain(std::iter::once(rest.to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = commands::load_config(cli.config.as_deref())?;
    let logging = loaded.config.logging();

    // Console (human-readable, stderr) + rotating JSON file
    let console_filter = if cli.verbose {
        directives("debug", "info")
    } else {
        std::env::var("RUST_LOG")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| logging.level.clone())
            .unwrap_or_else(|| directives("info", "warn"))
    };

    use tracing_subscriber::prelude::*;
    let (file_layer, _guard) = if logging.file {
        let log_dir = logging
            .dir
            .clone()
            .or_else(docket_config::default_log_dir)
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_appender = tracing_appender::rolling::daily(&log_dir, "docket.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(tracing_subscriber::EnvFilter::new(directives("trace", "info")));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(console_filter)),
        )
        .with(file_layer)
        .init();

    for warning in &loaded.warnings {
        warn!(%warning, "Configuration warning");
    }
    debug!(
        sources = ?loaded.loaded_from(),
        env_overrides = ?loaded.env_overrides,
        "Configuration loaded"
    );

    let ctx = commands::Context {
        config: loaded.config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Process(args) => process::run(args, &ctx).await,
        Commands::Ask(args) => ask::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Meetings(args) => meetings::run(args, &ctx).await,
    }
}
