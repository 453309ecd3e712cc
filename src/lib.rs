//! # localrag
//!
//! An offline retrieval-augmented document assistant: index a directory of
//! local documents into a persisted vector collection, then answer
//! questions about them with a locally running Ollama model. Nothing
//! leaves the machine.
//!
//! ## Overview
//!
//! Two binaries share one persisted artifact:
//!
//! - `ingest` — load documents from a data directory, chunk and embed
//!   them, and upsert the vectors into an on-disk collection.
//! - `query` — open the same collection and run an interactive loop:
//!   embed the question, retrieve the nearest chunks, and ask the
//!   generation model for an answer grounded in them.
//!
//! Every seam is a trait ([`EmbeddingProvider`], [`GenerationModel`],
//! [`VectorStore`], [`Chunker`], [`DocumentLoader`]) wired together by an
//! explicitly constructed [`RagPipeline`], so each one can be replaced
//! with a test double.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use localrag::{OllamaClient, OllamaConfig, OnDiskVectorStore, RagConfig, RagPipeline};
//!
//! let ollama = Arc::new(OllamaClient::new(OllamaConfig::default())?);
//! let store = Arc::new(OnDiskVectorStore::open("./vector_db").await?);
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedder(ollama.clone())
//!     .generator(ollama)
//!     .store(store)
//!     .build()?;
//!
//! pipeline.ingest_directory(Path::new("./data")).await?;
//! let answer = pipeline.answer("What does the syllabus cover?").await?;
//! ```
//!
//! ## Known limitations
//!
//! - Ingestion and query must not run concurrently against the same
//!   persistence directory; there is no cross-process locking.
//! - The collection must be queried with the same embedding model it was
//!   ingested with. A dimensionality mismatch is rejected; two different
//!   models with equal dimensionality are not detectable and produce
//!   meaningless similarity scores.

pub mod chunking;
pub mod config;
pub mod console;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod loader;
pub mod ollama;
pub mod ondisk;
pub mod pipeline;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::RagConfig;
pub use console::{TurnOutcome, is_exit_command, run_console, run_turn};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::GenerationModel;
pub use loader::{DirectoryLoader, DocumentLoader, MarkdownLoader, TextLoader};
pub use ollama::{OllamaClient, OllamaConfig};
pub use ondisk::OnDiskVectorStore;
pub use pipeline::{IngestStats, RagPipeline};
pub use vectorstore::VectorStore;
