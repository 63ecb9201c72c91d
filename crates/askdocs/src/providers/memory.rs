//! In-process vector index with cosine similarity

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{QueryMatch, VectorRecord};

use super::vector_index::VectorIndex;

/// In-memory index keyed by record identifier.
///
/// The default backend for tests and ephemeral runs; nothing is persisted
/// across processes.
#[derive(Default)]
pub struct MemoryIndex {
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl MemoryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let mut stored = self.records.write();
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let stored = self.records.read();
        let mut matches = Vec::with_capacity(stored.len());

        for record in stored.values() {
            if record.values.len() != vector.len() {
                return Err(Error::store(format!(
                    "dimension mismatch: query has {}, record '{}' has {}",
                    vector.len(),
                    record.id,
                    record.values.len()
                )));
            }
            matches.push(QueryMatch {
                score: cosine_similarity(vector, &record.values),
                metadata: record.metadata.clone(),
            });
        }

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Cosine similarity of two equal-length vectors, 0.0 when either is all
/// zeros.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, values: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values,
            metadata: crate::types::ChunkMetadata {
                text: format!("text for {}", id),
                source: "doc.txt".to_string(),
                chunk_index: 0,
                total_chunks: 1,
                ingested_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let index = MemoryIndex::new();
        index.upsert(&[record("a", vec![1.0, 0.0])]).await.unwrap();
        index.upsert(&[record("a", vec![0.0, 1.0])]).await.unwrap();
        assert_eq!(index.len().await.unwrap(), 1);

        let matches = index.query(&[0.0, 1.0], 1).await.unwrap();
        assert!((matches[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_query_ranks_descending_and_truncates() {
        let index = MemoryIndex::new();
        index
            .upsert(&[
                record("far", vec![0.0, 1.0]),
                record("near", vec![1.0, 0.1]),
                record("exact", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let matches = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0].score >= matches[1].score);
        assert_eq!(matches[0].metadata.text, "text for exact");
    }

    #[test]
    fn test_len_counts_stored_records() {
        let index = MemoryIndex::new();
        tokio_test::block_on(index.upsert(&[
            record("a", vec![1.0, 0.0]),
            record("b", vec![0.0, 1.0]),
        ]))
        .unwrap();
        assert_eq!(tokio_test::block_on(index.len()).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_a_store_error() {
        let index = MemoryIndex::new();
        index.upsert(&[record("a", vec![1.0, 0.0])]).await.unwrap();
        let err = index.query(&[1.0, 0.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }
}
