//! HTTP client for a hosted similarity index

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{ChunkMetadata, QueryMatch, VectorRecord};

use super::vector_index::VectorIndex;

/// Remote vector index reached over JSON/HTTP.
///
/// Expects the conventional hosted-index surface: `POST /vectors/upsert`
/// with a batch of records, `POST /query` with a vector and `top_k`.
pub struct RemoteIndex {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Deserialize)]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Deserialize)]
struct WireMatch {
    score: f32,
    metadata: Option<ChunkMetadata>,
}

impl RemoteIndex {
    /// Create a client for the index at `endpoint`
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::store(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait]
impl VectorIndex for RemoteIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let url = format!("{}/vectors/upsert", self.endpoint);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&UpsertRequest { vectors: records })
            .send()
            .await
            .map_err(|e| Error::store(format!("upsert request failed: {}", e)))?;
        let response = Self::check_status(response).await?;

        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|e| Error::store(format!("unparseable upsert response: {}", e)))?;
        if let Some(count) = parsed.upserted_count {
            if count != records.len() {
                return Err(Error::store(format!(
                    "upserted {} of {} records",
                    count,
                    records.len()
                )));
            }
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let url = format!("{}/query", self.endpoint);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&QueryRequest {
                vector,
                top_k,
                include_metadata: true,
            })
            .send()
            .await
            .map_err(|e| Error::store(format!("query request failed: {}", e)))?;
        let response = Self::check_status(response).await?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::store(format!("unparseable query response: {}", e)))?;

        let matches = parsed
            .matches
            .into_iter()
            .filter_map(|m| {
                m.metadata.map(|metadata| QueryMatch {
                    score: m.score,
                    metadata,
                })
            })
            .collect();
        Ok(matches)
    }

    async fn len(&self) -> Result<usize> {
        // The hosted surface exposes no cheap count; this is only used by
        // diagnostics, so report zero rather than scanning.
        Ok(0)
    }

    fn name(&self) -> &str {
        "remote"
    }
}
