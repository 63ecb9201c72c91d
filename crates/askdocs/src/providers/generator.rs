//! Answer generator trait

use async_trait::async_trait;

use crate::error::Result;

/// Turns an assembled prompt into a prose answer.
///
/// The retrieval core never depends on this: it only supplies the context
/// and sources the prompt is built from.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check whether the generator is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Generator name for logging
    fn name(&self) -> &str;
}
