//! Ingestion orchestration: scan, check, extract, segment, embed, upsert, record

use chrono::Utc;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use uuid::Uuid;

use crate::config::{AppConfig, ChunkingConfig};
use crate::error::Result;
use crate::providers::{EmbeddingProvider, VectorIndex};
use crate::sources::DocumentSource;
use crate::storage::{Ledger, LedgerRecord};
use crate::types::{Chunk, DocumentMeta};

use super::extract::TextExtractor;
use super::segmenter::segment;
use super::upsert::Upserter;

/// One document that could not be ingested
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    /// Document name
    pub name: String,
    /// What went wrong
    pub error: String,
}

/// Summary of one ingestion run
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Run identity, also tagged on the run's log lines
    pub run_id: Uuid,
    /// Documents ingested (new or re-ingested)
    pub ingested: usize,
    /// Documents skipped (unchanged, empty, or unextractable)
    pub skipped: usize,
    /// Documents that failed
    pub failed: Vec<DocumentFailure>,
}

impl IngestReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            ingested: 0,
            skipped: 0,
            failed: Vec::new(),
        }
    }
}

/// Per-document outcome inside a run
enum DocumentOutcome {
    Ingested(LedgerRecord),
    Skipped(String),
}

/// Drives ingestion across the document source.
///
/// Ingestion is a best-effort batch job over an operator-supplied set of
/// files: one malformed document must never block indexing of the rest, so
/// every per-document failure is caught here, logged with the document's
/// name, and recorded in the run report.
pub struct Ingestor {
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    upserter: Upserter,
    ledger_path: PathBuf,
    chunking: ChunkingConfig,
    concurrency: usize,
    /// Single-flight guard: at most one run at a time
    flight: Mutex<()>,
}

impl Ingestor {
    /// Create an orchestrator over the given collaborators
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: &AppConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            embedder,
            upserter: Upserter::new(index, config.index.upsert_batch_size),
            ledger_path: config.documents.ledger_path.clone(),
            chunking: config.chunking.clone(),
            concurrency: config.processing.document_concurrency(),
            flight: Mutex::new(()),
        }
    }

    /// Run one ingestion pass over the source.
    ///
    /// Returns `None` when another run is already in flight; the second
    /// trigger is a no-op. Two overlapping runs racing on the ledger would
    /// both re-ingest the same documents: harmless for correctness (same
    /// deterministic identifiers, last write wins) but wasteful.
    pub async fn run(&self) -> Result<Option<IngestReport>> {
        let _guard = match self.flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::info!("ingestion already in flight, ignoring trigger");
                return Ok(None);
            }
        };

        let run_id = Uuid::new_v4();
        let mut report = IngestReport::new(run_id);

        let documents = self.source.list().await?;
        tracing::info!(%run_id, "scan found {} candidate document(s)", documents.len());
        if documents.is_empty() {
            return Ok(Some(report));
        }

        let mut ledger = Ledger::load(&self.ledger_path);

        let mut pending = Vec::new();
        for meta in documents {
            if ledger.is_unchanged(&meta.name, meta.size, meta.modified) {
                tracing::info!(%run_id, "skipping '{}': unchanged", meta.name);
                report.skipped += 1;
            } else {
                pending.push(meta);
            }
        }

        // Bounded fan-out across documents, sized to respect the embedding
        // provider's rate limits.
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let tasks: Vec<_> = pending
            .into_iter()
            .map(|meta| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = semaphore.acquire().await.unwrap();
                    let outcome = self.process_document(&meta).await;
                    (meta, outcome)
                }
            })
            .collect();
        let outcomes = join_all(tasks).await;

        for (meta, outcome) in outcomes {
            match outcome {
                Ok(DocumentOutcome::Ingested(record)) => {
                    if let Some(previous) = ledger.get(&meta.name) {
                        if record.chunk_count < previous.chunk_count {
                            tracing::warn!(
                                %run_id,
                                "'{}' shrank from {} to {} chunks; {} stale vector(s) remain in the index",
                                meta.name,
                                previous.chunk_count,
                                record.chunk_count,
                                previous.chunk_count - record.chunk_count
                            );
                        }
                    }
                    tracing::info!(
                        %run_id,
                        "ingested '{}': {} chunk(s)",
                        meta.name,
                        record.chunk_count
                    );
                    ledger.insert(meta.name, record);
                    report.ingested += 1;
                }
                Ok(DocumentOutcome::Skipped(reason)) => {
                    tracing::info!(%run_id, "skipping '{}': {}", meta.name, reason);
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(%run_id, "failed to ingest '{}': {}", meta.name, e);
                    report.failed.push(DocumentFailure {
                        name: meta.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        if report.ingested > 0 {
            if let Err(e) = ledger.save(&self.ledger_path) {
                // Not fatal: the worst case is re-ingesting on the next run.
                tracing::warn!(%run_id, "could not persist ledger: {}", e);
            }
        }

        tracing::info!(
            %run_id,
            "ingestion done: {} ingested, {} skipped, {} failed",
            report.ingested,
            report.skipped,
            report.failed.len()
        );
        Ok(Some(report))
    }

    /// Ingest a single document end to end.
    async fn process_document(&self, meta: &DocumentMeta) -> Result<DocumentOutcome> {
        let data = self.source.read(&meta.name).await?;

        let extracted = match self.extractor.extract(&meta.name, &data) {
            Ok(extracted) => extracted,
            Err(e) => {
                return Ok(DocumentOutcome::Skipped(format!("extraction failed: {}", e)));
            }
        };
        if extracted.text.trim().is_empty() {
            return Ok(DocumentOutcome::Skipped("no extractable text".to_string()));
        }

        let chunks: Vec<Chunk> = segment(
            &extracted.text,
            self.chunking.chunk_size,
            self.chunking.chunk_overlap,
        )
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .enumerate()
        .map(|(i, text)| Chunk {
            filename: meta.name.clone(),
            index: i as u32,
            text,
        })
        .collect();
        if chunks.is_empty() {
            return Ok(DocumentOutcome::Skipped("no non-empty chunks".to_string()));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let ingested_at = Utc::now();
        self.upserter
            .upsert(&meta.name, &chunks, &embeddings, ingested_at)
            .await?;

        Ok(DocumentOutcome::Ingested(LedgerRecord {
            size: meta.size,
            last_modified: meta.modified,
            ingested_at,
            chunk_count: chunks.len() as u32,
            page_count: extracted.page_count,
        }))
    }
}
