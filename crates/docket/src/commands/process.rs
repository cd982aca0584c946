//! Process command - runs meeting notes through the pipeline by hand.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use console::{Style, style};
use docket_domain::{MeetingPipeline, ProcessRequest, ProcessResult};
use docket_types::Category;

use super::{Context, write_artifacts};

/// Arguments for the process command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// File with meeting notes (reads stdin when omitted)
    pub file: Option<PathBuf>,

    /// Meeting title (generated when omitted)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Meeting category (classified when omitted)
    #[arg(short, long)]
    pub category: Option<Category>,

    /// Write the generated .ics files into this directory
    #[arg(long, value_name = "DIR")]
    pub write_calendars: Option<PathBuf>,
}

/// Run the process command.
pub async fn run(args: ProcessArgs, ctx: &Context) -> Result<()> {
    let content = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if content.trim().is_empty() {
        bail!("No meeting content provided");
    }

    let mut request = ProcessRequest::new(content);
    if let Some(title) = args.title {
        request = request.with_title(title);
    }
    if let Some(category) = args.category {
        request = request.with_category(category);
    }

    let pipeline = MeetingPipeline::new(ctx.services()?);
    let result = pipeline.process(request, None).await?;

    let written = match &args.write_calendars {
        Some(dir) => write_artifacts(dir, &result.reminders)?,
        None => Vec::new(),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result, &written, ctx.verbose);
    }

    Ok(())
}

fn print_result(result: &ProcessResult, written: &[PathBuf], verbose: bool) {
    let dim = Style::new().dim();
    let yellow = Style::new().yellow();

    println!();
    println!("{}", style(&result.meeting.title).bold());
    println!(
        "{}",
        dim.apply_to(format!(
            "#{} · {} · {}",
            result.meeting.id,
            result.meeting.category,
            result.meeting.meeting_date.format("%Y-%m-%d %H:%M")
        ))
    );
    if !result.meeting.participants.is_empty() {
        println!(
            "{}",
            dim.apply_to(format!("With: {}", result.meeting.participants.join(", ")))
        );
    }
    println!();
    println!("{}", result.summary.trim());

    if !result.action_items.is_empty() {
        println!();
        println!("{}", style("Action items").bold());
        for item in &result.action_items {
            let due = item
                .due_date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "no due date".to_string());
            println!("  • {} {}", item.title, dim.apply_to(format!("({}, {})", item.priority, due)));
        }
    }

    if !result.reminders.is_empty() {
        println!();
        println!("{}", style("Calendar files").bold());
        for artifact in &result.reminders {
            println!("  {}", artifact.filename);
        }
        for path in written {
            println!("  {} {}", dim.apply_to("wrote"), path.display());
        }
    }

    if !result.degraded.is_empty() {
        println!();
        println!(
            "{}",
            yellow.apply_to(format!(
                "Some steps fell back to defaults: {}",
                result.degraded.join(", ")
            ))
        );
        if !verbose {
            println!("{}", dim.apply_to("Run with --verbose for details."));
        }
    }
    println!();
}
