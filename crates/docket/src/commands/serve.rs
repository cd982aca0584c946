//! Serve command - watches a messaging channel until interrupted.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use docket_config::ChannelKind;
use docket_domain::{IngestConfig, IngestionLoop};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Messaging channel: signal or telegram (overrides config)
    #[arg(long)]
    pub channel: Option<ChannelKind>,

    /// Skip checking (and pulling) the model at start-up
    #[arg(long)]
    pub skip_model_check: bool,

    /// Don't send the start-up greeting
    #[arg(long)]
    pub no_greeting: bool,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    let channel = ctx.channel(args.channel)?;

    if ctx.config.llm().verify_model
        && !args.skip_model_check
        && let Err(e) = services.gateway().ensure_model().await
    {
        warn!(error = %e, "Model check failed; responses will fall back to defaults");
    }

    if let Err(e) = channel.health_check().await {
        warn!(channel = channel.name(), error = %e, "Channel health check failed");
    }

    let ingest = ctx.config.ingest();
    let ingest_loop = IngestionLoop::new(
        services,
        channel.clone(),
        IngestConfig {
            poll_interval: ingest.poll_interval(),
            error_backoff: ingest.error_backoff(),
            greet_on_start: ingest.greet_on_start && !args.no_greeting,
        },
    );

    // ── Shutdown on Ctrl-C ──────────────────────────────────────────────

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    if !ctx.json_output {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Docket").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("  {} {}", dim.apply_to("Channel:"), channel.name());
        println!("  {} {}", dim.apply_to("Chat:"), channel.chat_id());
        println!();
        println!("  {}", dim.apply_to("Press Ctrl-C to stop."));
        println!();
    }

    ingest_loop.run(cancel).await;

    let status = ingest_loop.status();
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!(
            "Stopped. {} message(s) handled, {} failed, {} skipped.",
            status.handled, status.failed, status.skipped
        );
    }

    Ok(())
}
