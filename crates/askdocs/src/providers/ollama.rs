//! Ollama HTTP client for embeddings and answer generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::generator::AnswerGenerator;

/// Ollama API client with bounded retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaClient {
    /// Create a new client from config
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.config.max_retries;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::embedding("unknown error")))
    }

    /// Check whether the Ollama server responds
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding of exactly `dimensions` floats.
    ///
    /// Strict by design: a non-success status, an error payload, a missing
    /// or empty vector, and a wrong-length vector are all hard failures.
    pub async fn embed(&self, text: &str, dimensions: usize) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.base_url);
        let model = self.config.embed_model.clone();
        let client = self.client.clone();
        let text = text.to_string();

        self.retry_request(|| {
            let url = url.clone();
            let model = model.clone();
            let client = client.clone();
            let text = text.clone();

            async move {
                let request = EmbedRequest {
                    model,
                    prompt: text,
                };

                let response = client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::embedding(format!("request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::embedding(format!(
                        "HTTP {} from embedding endpoint",
                        response.status()
                    )));
                }

                let parsed: EmbedResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::embedding(format!("unparseable response: {}", e)))?;

                if let Some(message) = parsed.error {
                    return Err(Error::embedding(format!("provider error: {}", message)));
                }

                let embedding = parsed
                    .embedding
                    .ok_or_else(|| Error::embedding("response carries no embedding"))?;
                if embedding.is_empty() {
                    return Err(Error::embedding("provider returned an empty vector"));
                }
                if embedding.len() != dimensions {
                    return Err(Error::embedding(format!(
                        "expected {} dimensions, got {}",
                        dimensions,
                        embedding.len()
                    )));
                }

                Ok(embedding)
            }
        })
        .await
    }

    /// Generate a prose answer for `prompt`
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let model = self.config.generate_model.clone();
        let temperature = self.config.temperature;
        let client = self.client.clone();
        let prompt = prompt.to_string();

        tracing::debug!("generating answer with model {}", model);

        self.retry_request(|| {
            let url = url.clone();
            let model = model.clone();
            let client = client.clone();
            let prompt = prompt.clone();

            async move {
                let request = GenerateRequest {
                    model,
                    prompt,
                    stream: false,
                    options: GenerateOptions { temperature },
                };

                let response = client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::generation(format!("request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::generation(format!("HTTP {}: {}", status, body)));
                }

                let parsed: GenerateResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::generation(format!("unparseable response: {}", e)))?;

                if let Some(message) = parsed.error {
                    return Err(Error::generation(format!("provider error: {}", message)));
                }

                parsed
                    .response
                    .ok_or_else(|| Error::generation("response carries no text"))
            }
        })
        .await
    }
}

/// Embedding provider backed by an Ollama server
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create a new embedder
    pub fn new(config: &LlmConfig, dimensions: usize) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OllamaClient::new(config)?),
            dimensions,
        })
    }

    /// Create from an existing client
    pub fn from_client(client: Arc<OllamaClient>, dimensions: usize) -> Self {
        Self { client, dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text, self.dimensions).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Answer generator backed by an Ollama server
pub struct OllamaGenerator {
    client: Arc<OllamaClient>,
}

impl OllamaGenerator {
    /// Create a new generator
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OllamaClient::new(config)?),
        })
    }

    /// Create from an existing client
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
