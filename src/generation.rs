//! Generation model trait: prompt in, answer out.

use async_trait::async_trait;

use crate::error::Result;

/// A service that produces a natural-language answer for a prompt.
///
/// The prompt already contains the retrieved context and the user's
/// question; how the backend formats or conditions on it is opaque.
#[async_trait]
pub trait GenerationModel: Send + Sync {
    /// Generate an answer for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
