//! On-disk vector store: JSON-persisted collections with cosine search.
//!
//! [`OnDiskVectorStore`] keeps every collection in memory behind a
//! `tokio::sync::RwLock` and writes one JSON snapshot file per collection
//! after each mutation. Opening a store reloads all snapshots, which is
//! how the ingestion and query processes share a collection across runs.
//!
//! There is no cross-process locking: running ingestion and query against
//! the same persistence directory at the same time is unsupported.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "ondisk";

/// One named collection: its dimensionality and its chunks by id.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    dimensions: usize,
    chunks: HashMap<String, Chunk>,
}

/// A [`VectorStore`] persisted as JSON snapshot files in a directory.
///
/// # Example
///
/// ```rust,ignore
/// use localrag::OnDiskVectorStore;
///
/// let store = OnDiskVectorStore::open(Path::new("./vector_db")).await?;
/// store.create_collection("docs", 768).await?;
/// store.upsert("docs", &chunks).await?;
/// let results = store.search("docs", &query_embedding, 4).await?;
/// ```
#[derive(Debug)]
pub struct OnDiskVectorStore {
    dir: PathBuf,
    collections: RwLock<HashMap<String, Collection>>,
}

/// Cosine similarity of two equal-length vectors; 0.0 when either is zero.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn store_error(message: impl Into<String>) -> RagError {
    RagError::VectorStore { backend: BACKEND.to_string(), message: message.into() }
}

impl OnDiskVectorStore {
    /// Open a store rooted at `dir`, creating the directory if needed and
    /// loading any collection snapshots already present.
    ///
    /// Used by the ingestion pipeline, which is allowed to start from
    /// nothing.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            store_error(format!("failed to create '{}': {e}", dir.display()))
        })?;
        Self::load(dir).await
    }

    /// Open a store that must already exist.
    ///
    /// Used by the query pipeline: a missing persistence directory means
    /// ingestion has never run, which is an operator problem to fix, not a
    /// store failure.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] with remediation text if `dir` does
    /// not exist.
    pub async fn open_existing(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RagError::Config(format!(
                "vector database at '{}' not found; run the `ingest` binary first to create it",
                dir.display()
            )));
        }
        Self::load(dir.to_path_buf()).await
    }

    async fn load(dir: PathBuf) -> Result<Self> {
        let mut collections = HashMap::new();
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
            store_error(format!("failed to read '{}': {e}", dir.display()))
        })?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| store_error(format!("failed to read '{}': {e}", dir.display())))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                store_error(format!("failed to read snapshot '{}': {e}", path.display()))
            })?;
            let collection: Collection = serde_json::from_slice(&bytes).map_err(|e| {
                store_error(format!("corrupt snapshot '{}': {e}", path.display()))
            })?;
            debug!(
                collection = name,
                chunks = collection.chunks.len(),
                "loaded collection snapshot"
            );
            collections.insert(name.to_string(), collection);
        }
        info!(collections = collections.len(), dir = %dir.display(), "opened vector store");
        Ok(Self { dir, collections: RwLock::new(collections) })
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Write one collection's snapshot to disk. Called with the write lock
    /// held so snapshots always reflect a consistent state.
    async fn persist(&self, name: &str, collection: &Collection) -> Result<()> {
        let bytes = serde_json::to_vec(collection)
            .map_err(|e| store_error(format!("failed to serialize '{name}': {e}")))?;
        let path = self.snapshot_path(name);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            store_error(format!("failed to write snapshot '{}': {e}", path.display()))
        })
    }
}

#[async_trait::async_trait]
impl VectorStore for OnDiskVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        match collections.get(name) {
            Some(existing) if existing.dimensions == dimensions => Ok(()),
            Some(existing) => Err(store_error(format!(
                "collection '{name}' already exists with dimensionality {}, requested {}; \
                 it was ingested with a different embedding model",
                existing.dimensions, dimensions
            ))),
            None => {
                let collection = Collection { dimensions, chunks: HashMap::new() };
                self.persist(name, &collection).await?;
                collections.insert(name.to_string(), collection);
                info!(collection = name, dimensions, "created collection");
                Ok(())
            }
        }
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| store_error(format!("collection '{collection}' does not exist")))?;
        for chunk in chunks {
            if chunk.embedding.len() != entry.dimensions {
                return Err(store_error(format!(
                    "chunk '{}' has a {}-dimensional embedding, collection '{collection}' \
                     expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    entry.dimensions
                )));
            }
        }
        for chunk in chunks {
            entry.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        self.persist(collection, entry).await?;
        debug!(collection, upserted = chunks.len(), total = entry.chunks.len(), "upserted");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let entry = collections
            .get(collection)
            .ok_or_else(|| store_error(format!("collection '{collection}' does not exist")))?;
        if embedding.len() != entry.dimensions {
            return Err(store_error(format!(
                "query embedding has {} dimensions, collection '{collection}' expects {}; \
                 the query-time embedding model must match the one used at ingestion",
                embedding.len(),
                entry.dimensions
            )));
        }

        let mut scored: Vec<SearchResult> = entry
            .chunks
            .values()
            .map(|chunk| SearchResult {
                score: cosine_similarity(&chunk.embedding, embedding),
                chunk: chunk.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = [0.5f32, -0.3, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }
}
