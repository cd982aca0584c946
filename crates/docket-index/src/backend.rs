//! Index backend trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{IndexDocument, IndexHit, Metadata, QueryInput};

/// Trait for named-collection document stores.
///
/// Implementations must serialize their own writes; the index is shared
/// between the ingestion loop and manual pipeline runs.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    /// Insert or replace documents in a collection, creating it if needed.
    async fn upsert(&self, collection: &str, documents: Vec<IndexDocument>) -> Result<()>;

    /// Nearest-neighbour search, closest first.
    ///
    /// `filter` matches entries whose metadata equals every given key.
    async fn query(
        &self,
        collection: &str,
        input: &QueryInput,
        k: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<IndexHit>>;

    /// Check the backend is reachable.
    async fn heartbeat(&self) -> Result<()>;

    /// Get the name of this backend.
    fn name(&self) -> &str;
}
