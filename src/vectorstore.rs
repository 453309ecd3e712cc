//! Vector store trait for persisting and searching embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for named collections of embedded chunks.
///
/// Implementations own the persistence of (vector, text, metadata) tuples
/// and nearest-neighbor search over them. Upserts overwrite by chunk id,
/// which is what makes re-ingestion of an unchanged directory idempotent.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection with the given dimensionality.
    ///
    /// A no-op if the collection already exists with the same
    /// dimensionality; an error if it exists with a different one.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Whether a collection with this name exists.
    ///
    /// The query pipeline probes this before any service call so a missing
    /// collection surfaces as a configuration error, not a search failure.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Upsert chunks into a collection. Chunks must carry embeddings whose
    /// length matches the collection's dimensionality.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Return the `top_k` chunks most similar to the given embedding,
    /// ordered by descending similarity score.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}
