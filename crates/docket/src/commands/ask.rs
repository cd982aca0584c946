//! Ask command - one-shot question over stored meetings.

use anyhow::Result;
use clap::Args;
use console::Style;
use docket_domain::QueryService;
use docket_index::IndexHit;

use super::Context;

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to answer
    #[arg(required = true)]
    pub question: String,

    /// List the meetings the answer drew on
    #[arg(long)]
    pub show_sources: bool,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let query = QueryService::new(ctx.services()?);
    let answer = query.answer(&args.question).await;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("{}", answer.text.trim());

    if args.show_sources {
        let dim = Style::new().dim();
        println!();
        if answer.sources.is_empty() {
            println!("{}", dim.apply_to("No matching meetings."));
        }
        for hit in &answer.sources {
            println!("  {} {}", dim.apply_to("•"), source_label(hit));
        }
    }
    if answer.degraded && ctx.verbose {
        println!();
        println!("{}", Style::new().yellow().apply_to("The answer fell back to a default response."));
    }

    Ok(())
}

fn source_label(hit: &IndexHit) -> String {
    let field = |key: &str| hit.metadata.get(key).and_then(|v| v.as_str());
    let title = field("title").unwrap_or("Untitled meeting");
    let date = field("date").map(|d| d.get(..10).unwrap_or(d));
    match (field("category"), date) {
        (Some(category), Some(date)) => format!("{title} ({category}, {date})"),
        (Some(category), None) => format!("{title} ({category})"),
        _ => title.to_string(),
    }
}
