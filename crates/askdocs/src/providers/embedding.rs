//! Embedding provider trait with strict error semantics

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Generates fixed-dimension text embeddings.
///
/// Implementations are strict by default: a non-success upstream status, a
/// structured error payload, or a degenerate empty vector must surface as
/// `Error::Embedding`. A silently propagated zero-length vector corrupts
/// similarity search for that chunk with no visible symptom until query
/// time.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text. The returned vector's length
    /// always equals `dimensions()`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    ///
    /// The default implementation calls `embed` one at a time, in order, to
    /// respect upstream rate limits. A failure on any item aborts the batch
    /// and reports which item failed.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let embedding = self.embed(text).await.map_err(|e| {
                Error::embedding(format!("item {} of {}: {}", i + 1, texts.len(), e))
            })?;
            embeddings.push(embedding);
        }
        Ok(embeddings)
    }

    /// Embedding dimensionality this provider produces
    fn dimensions(&self) -> usize;

    /// Check whether the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
