//! Query-time retrieval and context assembly

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorIndex};
use crate::types::{Retrieval, SourceRef};

/// Divider between chunks in the assembled context
pub const CONTEXT_DIVIDER: &str = "\n\n---\n\n";

/// Answers "what do the documents say about this?" by embedding the
/// question, querying the index, and assembling a deduplicated context.
///
/// Stateless: every question is independent and queries may run fully
/// concurrently. The question must be embedded with the same dimensionality
/// used at ingestion or similarity is meaningless; sharing the ingestion
/// embedder guarantees that.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    max_question_len: usize,
}

impl Retriever {
    /// Create a retriever over the given embedder and index
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            max_question_len: config.max_question_len,
        }
    }

    /// Retrieve the `top_k` most relevant chunks for `question`.
    ///
    /// Zero matches is a successful no-content result, not an error.
    /// Failures of the embedding provider or the index propagate as a
    /// single failure for the request: no partial context is ever returned.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Retrieval> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::validation("question must not be empty"));
        }
        let length = question.chars().count();
        if length > self.max_question_len {
            return Err(Error::validation(format!(
                "question is {} characters, the maximum is {}",
                length, self.max_question_len
            )));
        }
        if top_k == 0 {
            return Err(Error::validation("top_k must be positive"));
        }

        let vector = self.embedder.embed(question).await?;
        let mut matches = self.index.query(&vector, top_k).await?;
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if matches.is_empty() {
            tracing::info!("no indexed content matched the question");
            return Ok(Retrieval::no_content());
        }

        let context = matches
            .iter()
            .map(|m| m.metadata.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DIVIDER);

        // Deduplicate on filename, keeping the highest-similarity occurrence.
        let mut sources: Vec<SourceRef> = Vec::new();
        for m in &matches {
            if !sources.iter().any(|s| s.filename == m.metadata.source) {
                sources.push(SourceRef {
                    filename: m.metadata.source.clone(),
                    score: m.score,
                    chunk_index: m.metadata.chunk_index,
                });
            }
        }

        tracing::debug!(
            "retrieved {} match(es) across {} source(s)",
            matches.len(),
            sources.len()
        );
        Ok(Retrieval {
            context,
            sources,
            match_count: matches.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::providers::MemoryIndex;
    use crate::types::{ChunkMetadata, VectorRecord};

    /// Embedder stub mapping every text to a fixed direction
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn record(source: &str, chunk_index: u32, values: Vec<f32>, text: &str) -> VectorRecord {
        VectorRecord {
            id: format!("{}-chunk-{}", source, chunk_index),
            values,
            metadata: ChunkMetadata {
                text: text.to_string(),
                source: source.to_string(),
                chunk_index,
                total_chunks: 2,
                ingested_at: Utc::now(),
            },
        }
    }

    fn retriever(index: Arc<MemoryIndex>) -> Retriever {
        Retriever::new(
            Arc::new(StubEmbedder),
            index,
            &RetrievalConfig {
                top_k: 5,
                max_question_len: 100,
            },
        )
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let retriever = retriever(Arc::new(MemoryIndex::new()));
        let err = retriever.retrieve("   ", 3).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_oversized_question_is_rejected() {
        let retriever = retriever(Arc::new(MemoryIndex::new()));
        let question = "q".repeat(101);
        let err = retriever.retrieve(&question, 3).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_zero_matches_is_no_content_not_an_error() {
        let retriever = retriever(Arc::new(MemoryIndex::new()));
        let retrieval = retriever.retrieve("anything indexed?", 3).await.unwrap();
        assert_eq!(retrieval.match_count, 0);
        assert!(retrieval.is_empty());
        assert!(retrieval.context.is_empty());
        assert!(retrieval.sources.is_empty());
    }

    #[tokio::test]
    async fn test_sources_deduplicate_on_filename_keeping_best() {
        let index = Arc::new(MemoryIndex::new());
        index
            .upsert(&[
                record("a.pdf", 0, vec![1.0, 0.0], "best a chunk"),
                record("a.pdf", 1, vec![0.9, 0.1], "second a chunk"),
                record("b.pdf", 0, vec![0.5, 0.5], "b chunk"),
            ])
            .await
            .unwrap();

        let retrieval = retriever(index).retrieve("question", 5).await.unwrap();
        assert_eq!(retrieval.match_count, 3);
        assert_eq!(retrieval.sources.len(), 2);
        assert_eq!(retrieval.sources[0].filename, "a.pdf");
        assert_eq!(retrieval.sources[0].chunk_index, 0);
        assert_eq!(retrieval.sources[1].filename, "b.pdf");
    }

    #[tokio::test]
    async fn test_context_is_divider_joined_in_descending_order() {
        let index = Arc::new(MemoryIndex::new());
        index
            .upsert(&[
                record("a.pdf", 0, vec![0.2, 0.8], "weak match"),
                record("b.pdf", 0, vec![1.0, 0.0], "strong match"),
            ])
            .await
            .unwrap();

        let retrieval = retriever(index).retrieve("question", 5).await.unwrap();
        assert_eq!(
            retrieval.context,
            format!("strong match{}weak match", CONTEXT_DIVIDER)
        );
    }

    #[tokio::test]
    async fn test_top_k_bounds_the_matches() {
        let index = Arc::new(MemoryIndex::new());
        index
            .upsert(&[
                record("a.pdf", 0, vec![1.0, 0.0], "one"),
                record("a.pdf", 1, vec![0.9, 0.1], "two"),
                record("b.pdf", 0, vec![0.8, 0.2], "three"),
            ])
            .await
            .unwrap();

        let retrieval = retriever(index).retrieve("question", 2).await.unwrap();
        assert_eq!(retrieval.match_count, 2);
    }
}
