//! Configuration for the ingestion and retrieval pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document source configuration
    #[serde(default)]
    pub documents: DocumentsConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Vector index configuration
    #[serde(default)]
    pub index: IndexConfig,
    /// Ollama/LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Ingestion processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// `path` is `None`. Environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!("cannot read config file '{}': {}", path.display(), e))
                })?;
                toml::from_str(&raw).map_err(|e| {
                    Error::config(format!("invalid config file '{}': {}", path.display(), e))
                })?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment-variable overrides. Secrets (the index API key)
    /// are expected to arrive this way rather than through the config file.
    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("ASKDOCS_DOCS_DIR") {
            self.documents.dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("ASKDOCS_OLLAMA_URL") {
            self.llm.base_url = url;
        }
        if let Ok(endpoint) = std::env::var("ASKDOCS_INDEX_ENDPOINT") {
            self.index.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("ASKDOCS_INDEX_API_KEY") {
            self.index.api_key = Some(key);
        }
    }

    /// Validate the configuration before any work starts.
    ///
    /// Both ingestion and retrieval refuse to proceed on a bad config;
    /// this is reported clearly instead of failing mid-run.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.embedding.dimensions == 0 {
            return Err(Error::config("embedding.dimensions must be positive"));
        }
        if self.index.upsert_batch_size == 0 {
            return Err(Error::config("index.upsert_batch_size must be positive"));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be positive"));
        }
        if self.index.backend == IndexBackend::Remote {
            if self.index.endpoint.as_deref().unwrap_or("").is_empty() {
                return Err(Error::config(
                    "remote index selected but index.endpoint is not set \
                     (set it in the config file or via ASKDOCS_INDEX_ENDPOINT)",
                ));
            }
            if self.index.api_key.as_deref().unwrap_or("").is_empty() {
                return Err(Error::config(
                    "remote index selected but no API key is set \
                     (set ASKDOCS_INDEX_API_KEY)",
                ));
            }
        }
        Ok(())
    }
}

/// Document source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Directory scanned for documents
    pub dir: PathBuf,
    /// Path of the persisted ingestion ledger
    pub ledger_path: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        let ledger_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("askdocs")
            .join("ledger.json");
        Self {
            dir: PathBuf::from("./documents"),
            ledger_path,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    /// Reject parameter combinations the segmenter cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(
                "chunking.chunk_overlap must be smaller than chunking.chunk_size",
            ));
        }
        Ok(())
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Expected embedding dimensionality. Retrieval must use the same value
    /// as ingestion or similarity scores are meaningless.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 768 }
    }
}

/// LLM (Ollama) configuration for embeddings and answer generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "phi3".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Vector index backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// In-process index, not persisted across runs
    #[default]
    Memory,
    /// Hosted similarity store reached over HTTP
    Remote,
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: IndexBackend,
    /// Endpoint of the remote index (required for the remote backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API key for the remote index (required for the remote backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Records per upsert request
    pub upsert_batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::Memory,
            endpoint: None,
            api_key: None,
            upsert_batch_size: 20,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of nearest matches requested per query
    pub top_k: usize,
    /// Maximum accepted question length in characters
    pub max_question_len: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_question_len: 1000,
        }
    }
}

/// Ingestion processing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of documents processed concurrently (default: CPU count, max 4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_documents: Option<usize>,
}

impl ProcessingConfig {
    /// Resolve the document concurrency bound. Kept small so the embedding
    /// provider's rate limits are respected.
    pub fn document_concurrency(&self) -> usize {
        self.parallel_documents
            .unwrap_or_else(|| num_cpus::get().min(4))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = AppConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_remote_backend_requires_credentials() {
        let mut config = AppConfig::default();
        config.index.backend = IndexBackend::Remote;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.index.endpoint = Some("https://index.example.com".to_string());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.index.api_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = AppConfig::default();
        let raw = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.chunking.chunk_size, config.chunking.chunk_size);
        assert_eq!(parsed.index.upsert_batch_size, config.index.upsert_batch_size);
    }
}
