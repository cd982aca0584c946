//! Status command - backend health and store statistics.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use docket_config::ChannelKind;
use docket_store::StoreStats;
use serde::Serialize;

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Check this channel instead of the configured one
    #[arg(long)]
    pub channel: Option<ChannelKind>,
}

/// One component's health.
#[derive(Debug, Serialize)]
struct ComponentStatus {
    name: String,
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentStatus {
    fn from_result<E: std::fmt::Display>(name: impl Into<String>, result: Result<(), E>) -> Self {
        Self {
            name: name.into(),
            healthy: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        }
    }
}

/// Status response for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    llm: ComponentStatus,
    index: ComponentStatus,
    channel: Option<ComponentStatus>,
    store: StoreStats,
    db_path: String,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let gateway = ctx.gateway()?;
    let llm = ComponentStatus::from_result(
        format!("ollama ({})", gateway.backend().model()),
        gateway.health_check().await,
    );

    let index = ctx.index()?;
    let index = ComponentStatus::from_result(
        index.backend().name().to_string(),
        index.heartbeat().await,
    );

    let channel = match ctx.channel(args.channel) {
        Ok(channel) => Some(ComponentStatus::from_result(
            channel.name().to_string(),
            channel.health_check().await,
        )),
        Err(_) if args.channel.is_none() && ctx.config.channel().kind.is_none() => None,
        Err(e) => Some(ComponentStatus {
            name: "channel".to_string(),
            healthy: false,
            error: Some(e.to_string()),
        }),
    };

    let db_path = ctx.config.storage().db_path();
    let store = ctx.store()?.stats()?;

    let output = StatusOutput {
        llm,
        index,
        channel,
        store,
        db_path: db_path.display().to_string(),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Docket Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    print_component("Model:", &output.llm, ctx.verbose);
    print_component("Index:", &output.index, ctx.verbose);
    match &output.channel {
        Some(channel) => print_component("Channel:", channel, ctx.verbose),
        None => println!("  {} {}", dim.apply_to("Channel:"), dim.apply_to("not configured")),
    }
    println!();
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("Database:"), output.db_path);
    println!(
        "  {} {} ({} processed)",
        dim.apply_to("Meetings:"),
        output.store.meetings,
        output.store.processed_meetings
    );
    println!(
        "  {} {} ({} pending)",
        dim.apply_to("Action items:"),
        output.store.action_items,
        output.store.pending_action_items
    );
    println!(
        "  {} {}",
        dim.apply_to("Conversations:"),
        output.store.conversation_turns
    );
    println!();

    Ok(())
}

fn print_component(label: &str, status: &ComponentStatus, verbose: bool) {
    let dim = Style::new().dim();
    let state = if status.healthy {
        Style::new().green().apply_to("● healthy")
    } else {
        Style::new().red().apply_to("● unavailable")
    };
    println!("  {} {} {}", dim.apply_to(label), state, dim.apply_to(&status.name));
    if verbose && let Some(error) = &status.error {
        println!("    {} {}", dim.apply_to("Error:"), error);
    }
}
