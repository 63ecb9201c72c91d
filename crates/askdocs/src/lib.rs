//! askdocs: document Q&A over a vector index
//!
//! The crate ingests a corpus of documents into a similarity index and
//! answers natural-language questions by retrieving relevant passages and
//! assembling a grounded context for an answer generator.
//!
//! The core is the ingestion-and-retrieval pipeline: change-aware
//! segmentation, deterministic record identity for re-indexing, batched
//! embedding, idempotent upsert, and query-time context assembly. The
//! embedding provider, vector index, text extraction, and answer generation
//! all sit behind narrow traits in [`providers`] and [`ingestion`].

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod sources;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use generation::PromptBuilder;
pub use ingestion::{IngestReport, Ingestor};
pub use retrieval::Retriever;
pub use storage::{Ledger, LedgerRecord};
pub use types::{Retrieval, SourceRef};
