//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document loaded from the data directory.
///
/// The `id` is the path of the file relative to the data directory root,
/// which keeps re-ingestion of an unchanged directory idempotent: the same
/// file always produces the same document and chunk ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Root-relative source path, used as the stable identifier.
    pub id: String,
    /// The full text content of the document.
    pub text: String,
    /// Key-value metadata (extension, size, modification time, format).
    pub metadata: HashMap<String, String>,
    /// Absolute path of the file the document was loaded from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

/// A segment of a [`Document`] sized for embedding.
///
/// Chunk ids follow the `{document_id}_{chunk_index}` scheme, so ingesting
/// the same directory twice upserts over the same keys instead of growing
/// the collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{document_id}_{chunk_index}`.
    pub id: String,
    /// The text span covered by this chunk.
    pub text: String,
    /// The embedding vector; empty until the embedding step has run.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus `chunk_index`.
    pub metadata: HashMap<String, String>,
    /// The id of the parent [`Document`].
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity against the query embedding (higher is closer).
    pub score: f32,
}
