//! RAG pipeline orchestrator.
//!
//! [`RagPipeline`] wires an [`EmbeddingProvider`], a [`GenerationModel`],
//! a [`VectorStore`], a [`Chunker`], and a [`DirectoryLoader`] into the
//! two flows this crate exists for:
//!
//! - ingestion: load directory → chunk → embed → upsert
//! - query: embed question → nearest-neighbor search → grounded prompt →
//!   generate answer
//!
//! All collaborators are explicitly constructed and passed in through the
//! builder, so every seam can be replaced with a test double.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationModel;
use crate::loader::DirectoryLoader;
use crate::vectorstore::VectorStore;

/// Counts reported by a completed ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Documents loaded from the data directory.
    pub documents: usize,
    /// Chunks embedded and upserted into the collection.
    pub chunks: usize,
}

/// The RAG pipeline orchestrator. Construct via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationModel>,
    store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    loader: Arc<DirectoryLoader>,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Ingest every supported document under `data_dir` into the
    /// configured collection, creating the collection if absent.
    ///
    /// This is the whole batch job: any embedding or store failure aborts
    /// the run and surfaces to the operator. There is no partial-success
    /// tracking and no resumability.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `data_dir` is missing (before any
    /// service call), or [`RagError::Pipeline`] wrapping the first service
    /// failure.
    pub async fn ingest_directory(&self, data_dir: &Path) -> Result<IngestStats> {
        let documents = self.loader.load_directory(data_dir)?;

        let collection = &self.config.collection;
        self.store
            .create_collection(collection, self.embedder.dimensions())
            .await
            .map_err(|e| {
                error!(collection, error = %e, "failed to create collection");
                RagError::Pipeline(format!("failed to create collection '{collection}': {e}"))
            })?;

        let mut stats = IngestStats { documents: documents.len(), chunks: 0 };
        for document in &documents {
            stats.chunks += self.ingest_document(document).await?.len();
        }

        info!(documents = stats.documents, chunks = stats.chunks, "ingestion complete");
        Ok(stats)
    }

    /// Ingest a single document: chunk → embed → upsert.
    ///
    /// Returns the chunks that were stored, embeddings attached.
    pub async fn ingest_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            info!(document.id = %document.id, chunk_count = 0, "ingested document (empty)");
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "embedding failed during ingestion");
            RagError::Pipeline(format!("embedding failed for document '{}': {e}", document.id))
        })?;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.store.upsert(&self.config.collection, &chunks).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "upsert failed during ingestion");
            RagError::Pipeline(format!("upsert failed for document '{}': {e}", document.id))
        })?;

        info!(document.id = %document.id, chunk_count = chunks.len(), "ingested document");
        Ok(chunks)
    }

    /// Fail with a remediation-carrying [`RagError::Config`] unless the
    /// configured collection exists.
    ///
    /// The query binary calls this before entering the interactive loop,
    /// so a missing collection is caught before any network call.
    pub async fn require_collection(&self) -> Result<()> {
        if self.store.collection_exists(&self.config.collection).await? {
            Ok(())
        } else {
            Err(RagError::Config(format!(
                "collection '{}' not found in the vector database; run the `ingest` binary \
                 first to index your documents",
                self.config.collection
            )))
        }
    }

    /// Retrieve the chunks most similar to `query`: embed, then search.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::Pipeline(format!("query embedding failed: {e}"))
        })?;

        let results = self
            .store
            .search(&self.config.collection, &query_embedding, self.config.top_k)
            .await
            .map_err(|e| {
                error!(collection = %self.config.collection, error = %e, "search failed");
                RagError::Pipeline(format!(
                    "search failed in collection '{}': {e}",
                    self.config.collection
                ))
            })?;

        info!(result_count = results.len(), "retrieval completed");
        Ok(results)
    }

    /// Answer a question grounded in retrieved context: retrieve, build
    /// the prompt, generate.
    pub async fn answer(&self, question: &str) -> Result<String> {
        let results = self.retrieve(question).await?;
        let prompt = build_prompt(question, &render_context(&results));
        self.generator.generate(&prompt).await.map_err(|e| {
            error!(error = %e, "generation failed");
            RagError::Pipeline(format!("generation failed: {e}"))
        })
    }
}

/// Render retrieved chunks into the context block of the prompt.
fn render_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "(no relevant context found)".to_string();
    }
    let mut out = String::new();
    for result in results {
        out.push_str(&format!(
            "[{} | score {:.3}]\n{}\n---\n",
            result.chunk.document_id,
            result.score,
            result.chunk.text.trim()
        ));
    }
    out
}

/// Build the generation prompt from the question and its context block.
fn build_prompt(question: &str, context_block: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are an offline assistant answering questions about a local document \
         collection. Answer using only the context below. If the context does not \
         contain the answer, say that you do not know.\n\n",
    );
    prompt.push_str("Context:\n");
    prompt.push_str(context_block);
    prompt.push_str("\n\nQuestion:\n");
    prompt.push_str(question);
    prompt.push_str("\n\nAnswer:");
    prompt
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedder`, `generator`, and `store` are required; the
/// chunker defaults to a [`RecursiveChunker`](crate::RecursiveChunker)
/// sized from the config, and the loader to the built-in formats.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn GenerationModel>>,
    store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    loader: Option<Arc<DirectoryLoader>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the generation model.
    pub fn generator(mut self, generator: Arc<dyn GenerationModel>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the vector store backend.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Override the directory loader.
    pub fn loader(mut self, loader: Arc<DirectoryLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build the [`RagPipeline`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let embedder =
            self.embedder.ok_or_else(|| RagError::Config("embedder is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| RagError::Config("generator is required".to_string()))?;
        let store =
            self.store.ok_or_else(|| RagError::Config("store is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(crate::chunking::RecursiveChunker::new(
                config.chunk_size,
                config.chunk_overlap,
            ))
        });
        let loader = self.loader.unwrap_or_else(|| Arc::new(DirectoryLoader::new()));

        Ok(RagPipeline { config, embedder, generator, store, chunker, loader })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    fn result(doc: &str, text: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: format!("{doc}_0"),
                text: text.to_string(),
                embedding: Vec::new(),
                metadata: HashMap::new(),
                document_id: doc.to_string(),
            },
            score,
        }
    }

    #[test]
    fn prompt_contains_context_and_question() {
        let results = vec![result("notes.txt", "the sky is blue", 0.9)];
        let prompt = build_prompt("why is the sky blue?", &render_context(&results));
        assert!(prompt.contains("the sky is blue"));
        assert!(prompt.contains("why is the sky blue?"));
        assert!(prompt.contains("notes.txt"));
    }

    #[test]
    fn empty_retrieval_still_produces_a_prompt() {
        let prompt = build_prompt("anything?", &render_context(&[]));
        assert!(prompt.contains("(no relevant context found)"));
    }

    #[test]
    fn builder_requires_core_components() {
        let err = RagPipeline::builder().build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }
}
