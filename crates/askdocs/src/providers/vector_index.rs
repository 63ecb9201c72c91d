//! Vector index trait: the contract the pipeline relies on

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{QueryMatch, VectorRecord};

/// A similarity index holding vector records.
///
/// The pipeline relies only on this contract: insert-or-overwrite by
/// identifier, and approximate nearest-neighbor retrieval by cosine
/// similarity. The index's internal ranking algorithm is its own business.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite records by identifier.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Return up to `top_k` matches for `vector`, ranked descending by
    /// similarity.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>>;

    /// Number of records currently stored
    async fn len(&self) -> Result<usize>;

    /// Index name for logging
    fn name(&self) -> &str;
}
