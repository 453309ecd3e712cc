//! Ollama HTTP client: embeddings and generation against a local server.
//!
//! One [`OllamaClient`] implements both [`EmbeddingProvider`] and
//! [`GenerationModel`], calling the REST endpoints of a locally running
//! Ollama instance with `reqwest`. Nothing leaves the machine.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationModel;

/// Default base URL of a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Dimensionality of `nomic-embed-text` vectors.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

/// Default generation model.
const DEFAULT_GENERATION_MODEL: &str = "llama3";

/// Default per-request timeout. Cold local models can take minutes to
/// answer.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(360);

/// Configuration for an [`OllamaClient`].
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Model used for the embeddings endpoint.
    pub embedding_model: String,
    /// Dimensionality the embedding model produces.
    pub embedding_dimensions: usize,
    /// Model used for the generate endpoint.
    pub generation_model: String,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl OllamaConfig {
    /// Set the server base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the embedding model and the dimensionality it produces.
    ///
    /// The dimensionality must match whatever model populated the
    /// collection being queried; the store rejects mismatched vectors.
    pub fn with_embedding_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.embedding_model = model.into();
        self.embedding_dimensions = dimensions;
        self
    }

    /// Set the generation model.
    pub fn with_generation_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model = model.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Client for a local Ollama server.
///
/// # Example
///
/// ```rust,ignore
/// use localrag::ollama::{OllamaClient, OllamaConfig};
///
/// let client = OllamaClient::new(OllamaConfig::default())?;
/// let embedding = client.embed("hello world").await?;
/// let answer = client.generate("Why is the sky blue?").await?;
/// ```
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new client for the configured server.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RagError::Pipeline(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f64>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ApiError {
    error: String,
}

/// Pull a readable message out of a non-2xx response body.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiError>(&body).map(|e| e.error).unwrap_or(body);
    format!("server returned {status}: {detail}")
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(model = %self.config.embedding_model, text_len = text.len(), "embedding text");

        let request = EmbeddingsRequest { model: &self.config.embedding_model, prompt: text };
        let response = self
            .client
            .post(self.endpoint("api/embeddings"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "embeddings request failed");
                RagError::Embedding {
                    provider: "ollama".to_string(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            return Err(RagError::Embedding {
                provider: "ollama".to_string(),
                message: error_detail(response).await,
            });
        }

        let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
            RagError::Embedding {
                provider: "ollama".to_string(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        // The server reports f64 components; the store works in f32.
        let embedding: Vec<f32> = parsed.embedding.iter().map(|x| *x as f32).collect();

        if embedding.len() != self.config.embedding_dimensions {
            return Err(RagError::Embedding {
                provider: "ollama".to_string(),
                message: format!(
                    "model '{}' returned a {}-dimensional vector, expected {}; \
                     check the embedding model configuration",
                    self.config.embedding_model,
                    embedding.len(),
                    self.config.embedding_dimensions
                ),
            });
        }

        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.config.embedding_dimensions
    }
}

#[async_trait]
impl GenerationModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.config.generation_model, prompt_len = prompt.len(), "generating");

        let request = GenerateRequest {
            model: &self.config.generation_model,
            prompt,
            stream: false,
        };
        let response = self
            .client
            .post(self.endpoint("api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "generate request failed");
                RagError::Generation {
                    provider: "ollama".to_string(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            return Err(RagError::Generation {
                provider: "ollama".to_string(),
                message: error_detail(response).await,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            RagError::Generation {
                provider: "ollama".to_string(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_handles_trailing_slash() {
        let client = OllamaClient::new(
            OllamaConfig::default().with_base_url("http://localhost:11434/"),
        )
        .unwrap();
        assert_eq!(client.endpoint("api/generate"), "http://localhost:11434/api/generate");
    }
}
