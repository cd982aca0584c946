//! Persistence for Docket.
//!
//! The [`MeetingStore`] trait is what the pipeline and ingestion loop see;
//! [`SqliteStore`] implements it over a single rusqlite connection.

pub mod backend;
pub mod error;
pub mod sqlite;

pub use backend::{MeetingStore, StoreStats};
pub use error::{Result, StoreError};
pub use sqlite::SqliteStore;
