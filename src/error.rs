//! Error types for the `localrag` crate.

use thiserror::Error;

/// Errors produced by the ingestion and query pipelines.
///
/// The variants split into two classes with different handling policies:
/// [`Config`](RagError::Config) is fatal in both binaries (printed with its
/// remediation text, then the process exits), while every other variant is
/// fatal during a batch ingestion run but caught and reported inline by the
/// interactive query loop.
#[derive(Debug, Error)]
pub enum RagError {
    /// A required directory or collection is missing or invalid.
    ///
    /// The message carries remediation instructions for the operator.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A call to the embedding service failed.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A call to the generation service failed.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A document could not be loaded from disk.
    #[error("Document loading error: {0}")]
    Loader(String),

    /// An error in pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
