//! Document, chunk, and vector record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported source file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
}

impl FileType {
    /// Detect file type from a filename, `None` for unsupported extensions.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext)?;
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" => Some(Self::Txt),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

/// A candidate document discovered on a scan.
///
/// Size and modification time are the change signal consulted against the
/// ledger; content is read separately and never held here.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMeta {
    /// Stable name, unique within the source
    pub name: String,
    /// Byte size
    pub size: u64,
    /// Last-modified timestamp as reported by the source
    pub modified: DateTime<Utc>,
}

/// A contiguous, possibly-overlapping piece of a document's extracted text.
///
/// Indices are dense per document starting at 0; text is non-empty after
/// trimming. Chunks live only for the duration of one ingestion pass.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Source document name
    pub filename: String,
    /// Ordinal position within the document
    pub index: u32,
    /// Chunk text
    pub text: String,
}

/// Metadata stored alongside each vector in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Chunk text
    pub text: String,
    /// Source document name
    pub source: String,
    /// Ordinal position within the document
    pub chunk_index: u32,
    /// Total chunks produced for the document in the same pass
    pub total_chunks: u32,
    /// When the document was ingested
    pub ingested_at: DateTime<Utc>,
}

/// The persisted unit in the vector index.
///
/// The identifier is a pure function of `(filename, chunk index)`, so
/// re-ingesting a document reproduces the same identifiers and overwrites
/// existing records instead of duplicating them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Deterministic identifier
    pub id: String,
    /// Embedding vector
    pub values: Vec<f32>,
    /// Chunk metadata
    pub metadata: ChunkMetadata,
}
