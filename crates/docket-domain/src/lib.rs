//! Domain layer for Docket.
//!
//! Sits between the binary and the infrastructure crates:
//!
//! - **Meeting pipeline**: title, category, persistence, indexing, action
//!   items, summary, reminders and optional delivery for one block of text
//! - **Question answering**: retrieve meeting context, answer from it
//! - **Ingestion loop**: poll a channel, drop already-seen messages, route
//!   each new one to the pipeline or the question path
//!
//! # Example
//!
//! ```ignore
//! let services = Services::new(gateway, index, store);
//! let pipeline = MeetingPipeline::new(services.clone());
//! let result = pipeline.process(ProcessRequest::new(notes), None).await?;
//! ```

pub mod classifier;
mod error;
pub mod participants;
pub mod services;

pub use classifier::{classify, is_meeting_content};
pub use error::{DomainError, Result};
pub use participants::extract_participants;
pub use services::ingest::{IngestConfig, IngestionLoop, LoopStatus, PollReport};
pub use services::pipeline::{
    DeliveryReport, MeetingMatch, MeetingPipeline, ProcessRequest, ProcessResult,
};
pub use services::query::{Answer, QueryService};
pub use services::{DomainConfig, Services};
