//! Meetings command - browse, search and re-export stored meetings.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};
use docket_domain::{MeetingMatch, MeetingPipeline};
use docket_reminders::ReminderArtifact;
use docket_store::MeetingStore;
use docket_types::{ActionItem, ActionStatus, Category, MeetingRecord, RecordId};
use serde::Serialize;

use super::{Context, write_artifacts};

/// Arguments for the meetings command.
#[derive(Args, Debug)]
pub struct MeetingsArgs {
    #[command(subcommand)]
    pub command: MeetingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum MeetingsCommand {
    /// List meetings, newest first
    List {
        /// Only meetings in this category
        #[arg(short, long)]
        category: Option<Category>,

        /// Maximum number of meetings
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Skip this many meetings
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Show one meeting with its action items
    Show {
        /// Meeting id
        id: RecordId,
    },

    /// Change an action item's status
    SetStatus {
        /// Action item id
        item: RecordId,

        /// pending, in_progress, completed or cancelled
        status: ActionStatus,
    },

    /// Find meetings similar to a query
    Search {
        /// Text to search for
        query: String,

        /// Maximum number of matches
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Rebuild .ics files for a meeting's pending action items
    Calendar {
        /// Meeting id
        id: RecordId,

        /// Directory to write the files into (lists them when omitted)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct CalendarExport<'a> {
    meeting_id: RecordId,
    calendar_files: &'a [ReminderArtifact],
    written: &'a [PathBuf],
}

#[derive(Debug, Serialize)]
struct MeetingDetail<'a> {
    meeting: &'a MeetingRecord,
    action_items: &'a [ActionItem],
}

/// Run the meetings command.
pub async fn run(args: MeetingsArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store()?;

    match args.command {
        MeetingsCommand::List {
            category,
            limit,
            offset,
        } => {
            let meetings = store.list_meetings(category, limit, offset)?;
            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&meetings)?);
            } else {
                print_list(&meetings);
            }
        }
        MeetingsCommand::Show { id } => {
            let Some(meeting) = store.get_meeting(id)? else {
                bail!("Meeting {} not found", id);
            };
            let action_items = store.action_items_for_meeting(id)?;
            if ctx.json_output {
                let detail = MeetingDetail {
                    meeting: &meeting,
                    action_items: &action_items,
                };
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print_detail(&meeting, &action_items, ctx.verbose);
            }
        }
        MeetingsCommand::SetStatus { item, status } => {
            store.update_action_item_status(item, status)?;
            if ctx.json_output {
                println!("{}", serde_json::json!({ "id": item, "status": status }));
            } else {
                println!("Action item {} marked {}", item, status);
            }
        }
        MeetingsCommand::Search { query, limit } => {
            let pipeline = MeetingPipeline::new(ctx.services()?);
            let matches = pipeline.search_meetings(&query, limit).await?;
            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                print_matches(&matches);
            }
        }
        MeetingsCommand::Calendar { id, out } => {
            let pipeline = MeetingPipeline::new(ctx.services()?);
            let artifacts = pipeline.regenerate_calendar(id)?;
            let written = match &out {
                Some(dir) => write_artifacts(dir, &artifacts)?,
                None => Vec::new(),
            };
            if ctx.json_output {
                let export = CalendarExport {
                    meeting_id: id,
                    calendar_files: &artifacts,
                    written: &written,
                };
                println!("{}", serde_json::to_string_pretty(&export)?);
            } else {
                print_calendar(&artifacts, &written);
            }
        }
    }

    Ok(())
}

fn print_list(meetings: &[MeetingRecord]) {
    let dim = Style::new().dim();
    if meetings.is_empty() {
        println!("{}", dim.apply_to("No meetings stored yet."));
        return;
    }
    for meeting in meetings {
        let marker = if meeting.processed { " " } else { "*" };
        println!(
            "{:>5}{} {}  {} {}",
            meeting.id,
            marker,
            meeting.meeting_date.format("%Y-%m-%d"),
            meeting.title,
            dim.apply_to(format!("[{}]", meeting.category))
        );
    }
}

fn print_matches(matches: &[MeetingMatch]) {
    let dim = Style::new().dim();
    if matches.is_empty() {
        println!("{}", dim.apply_to("No similar meetings found."));
        return;
    }
    for found in matches {
        println!(
            "{:>5}  {}  {} {}",
            found.meeting.id,
            found.meeting.meeting_date.format("%Y-%m-%d"),
            style(&found.meeting.title).bold(),
            dim.apply_to(format!("[{:.2}]", found.relevance))
        );
        println!("       {}", dim.apply_to(found.snippet.replace('\n', " ")));
    }
}

fn print_calendar(artifacts: &[ReminderArtifact], written: &[PathBuf]) {
    let dim = Style::new().dim();
    if artifacts.is_empty() {
        println!("{}", dim.apply_to("No pending action items with due dates found."));
        return;
    }
    for artifact in artifacts {
        println!("  {}", artifact.filename);
    }
    for path in written {
        println!("  {} {}", dim.apply_to("wrote"), path.display());
    }
}

fn print_detail(meeting: &MeetingRecord, items: &[ActionItem], verbose: bool) {
    let dim = Style::new().dim();
    println!();
    println!("{}", style(&meeting.title).bold());
    println!(
        "{}",
        dim.apply_to(format!(
            "#{} · {} · {} · via {}",
            meeting.id,
            meeting.category,
            meeting.meeting_date.format("%Y-%m-%d %H:%M"),
            meeting.source.as_str()
        ))
    );
    if !meeting.participants.is_empty() {
        println!("{}", dim.apply_to(format!("With: {}", meeting.participants.join(", "))));
    }
    println!();
    match &meeting.summary {
        Some(summary) => println!("{}", summary.trim()),
        None => println!("{}", dim.apply_to("Not processed yet.")),
    }

    if !items.is_empty() {
        println!();
        println!("{}", style("Action items").bold());
        for item in items {
            let due = item
                .due_date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "no due date".to_string());
            println!(
                "  {:>4} [{}] {} {}",
                item.id,
                item.status,
                item.title,
                dim.apply_to(format!("({}, {})", item.priority, due))
            );
        }
    }

    if verbose {
        println!();
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("{}", meeting.content.trim());
    }
    println!();
}
