//! Deterministic vector record construction and batched upsert

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::VectorIndex;
use crate::types::{Chunk, ChunkMetadata, VectorRecord};

/// Build the deterministic record identifier for a chunk.
///
/// The identifier is a pure function of `(filename, index)`: re-ingesting
/// the same document with the same chunking reproduces the same identifiers,
/// so the index overwrites instead of accumulating duplicates.
pub fn record_id(filename: &str, index: u32) -> String {
    format!("{}-chunk-{}", sanitize(filename), index)
}

/// Map any character outside the identifier-safe set to an underscore, so
/// identifiers stay stable and legal for the store.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes chunk records to the vector index in bounded batches.
pub struct Upserter {
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
}

impl Upserter {
    /// Create an upserter writing `batch_size` records per request
    pub fn new(index: Arc<dyn VectorIndex>, batch_size: usize) -> Self {
        Self {
            index,
            batch_size: batch_size.max(1),
        }
    }

    /// Build one record per chunk and submit them in batches.
    ///
    /// Any batch failure fails the whole document: the caller must not
    /// record partial ingestion in the ledger.
    pub async fn upsert(
        &self,
        filename: &str,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
        ingested_at: DateTime<Utc>,
    ) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::store(format!(
                "'{}': {} chunks but {} embeddings",
                filename,
                chunks.len(),
                embeddings.len()
            )));
        }

        let total_chunks = chunks.len() as u32;
        let mut records = Vec::with_capacity(chunks.len());
        for (chunk, values) in chunks.iter().zip(embeddings) {
            if values.is_empty() {
                return Err(Error::store(format!(
                    "'{}' chunk {} has an empty embedding",
                    filename, chunk.index
                )));
            }
            records.push(VectorRecord {
                id: record_id(filename, chunk.index),
                values: values.clone(),
                metadata: ChunkMetadata {
                    text: chunk.text.clone(),
                    source: chunk.filename.clone(),
                    chunk_index: chunk.index,
                    total_chunks,
                    ingested_at,
                },
            });
        }

        for batch in records.chunks(self.batch_size) {
            self.index.upsert(batch).await?;
            tracing::debug!("upserted batch of {} record(s) for '{}'", batch.len(), filename);
        }

        Ok(records.len())
    }
}
