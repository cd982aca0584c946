//! Domain services.
//!
//! [`Services`] is built once at start-up and handed to the pipeline, the
//! question path and the ingestion loop. Nothing in this crate reaches for
//! a global handle.

pub mod ingest;
pub mod pipeline;
pub mod query;

use std::sync::Arc;
use std::time::Duration;

use docket_index::SemanticIndex;
use docket_llm::Gateway;
use docket_reminders::CalendarBuilder;
use docket_store::MeetingStore;
use tracing::info;

/// Tunables for the domain services.
#[derive(Debug, Clone)]
pub struct DomainConfig {
    /// Use multi-alert deadline reminders for high/urgent items.
    pub escalate_deadlines: bool,
    /// Pause between consecutive channel sends.
    pub send_delay: Duration,
    /// Meetings pulled into question-answering context.
    pub context_results: usize,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            escalate_deadlines: false,
            send_delay: Duration::from_millis(500),
            context_results: 3,
        }
    }
}

/// Shared handles used by every domain operation.
#[derive(Clone)]
pub struct Services {
    gateway: Gateway,
    index: SemanticIndex,
    store: Arc<dyn MeetingStore>,
    calendar: CalendarBuilder,
    config: DomainConfig,
}

impl Services {
    pub fn new(gateway: Gateway, index: SemanticIndex, store: Arc<dyn MeetingStore>) -> Self {
        info!(
            llm = gateway.backend().name(),
            index = index.backend().name(),
            "Initializing domain services"
        );
        Self {
            gateway,
            index,
            store,
            calendar: CalendarBuilder::default(),
            config: DomainConfig::default(),
        }
    }

    pub fn with_calendar(mut self, calendar: CalendarBuilder) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn with_config(mut self, config: DomainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn index(&self) -> &SemanticIndex {
        &self.index
    }

    pub fn store(&self) -> &Arc<dyn MeetingStore> {
        &self.store
    }

    pub fn calendar(&self) -> &CalendarBuilder {
        &self.calendar
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }
}
