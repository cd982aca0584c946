//! Semantic index for Docket.
//!
//! Meetings, action items and conversation turns are stored as text plus
//! metadata in per-kind collections and retrieved by similarity. The
//! [`SemanticIndex`] facade assigns entry ids, degrades failed reads to
//! empty results and formats retrieved meetings as question context.
//!
//! Two [`IndexBackend`]s are provided: [`ChromaBackend`] for a Chroma
//! server and [`MemoryIndexBackend`] for single-process use and tests.

pub mod backend;
pub mod chroma;
pub mod error;
pub mod index;
pub mod memory;
pub mod types;

pub use backend::IndexBackend;
pub use chroma::ChromaBackend;
pub use error::{IndexError, Result};
pub use index::{MeetingContext, NO_CONTEXT, SemanticIndex, format_context};
pub use memory::{MemoryIndexBackend, cosine_similarity};
pub use types::{EntryKind, IndexDocument, IndexHit, Metadata, QueryInput};
