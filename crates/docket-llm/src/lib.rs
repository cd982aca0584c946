//! Language-model gateway for Docket.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Gateway                                 │
//! │  title / categorize / extract / summarize│
//! │  embed / answer_with_context             │
//! └──────────────────────────────────────────┘
//!                    │
//!           LlmBackend trait
//!        ┌───────────┴───────────┐
//!        ▼                       ▼
//!   ┌─────────┐            ┌───────────┐
//!   │ Ollama  │            │   Mock    │
//!   └─────────┘            └───────────┘
//! ```
//!
//! Backends return raw text or an error. The [`Gateway`] owns the prompts
//! and turns every failure into a degraded [`Outcome`](docket_types::Outcome).

pub mod backend;
pub mod error;
pub mod extraction;
pub mod gateway;
pub mod ollama;
pub mod prompts;

pub use backend::{
    ChatMessage, ChatRequest, LlmBackend, MockBackend, MockReply, Role, SharedBackend,
};
pub use error::{LlmError, Result};
pub use extraction::{ActionItemCandidate, parse_action_items};
pub use gateway::{GENERIC_APOLOGY, Gateway, HTTP_APOLOGY, TIMEOUT_APOLOGY};
pub use ollama::{OllamaBackend, OllamaConfig};
