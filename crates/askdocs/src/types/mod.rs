//! Core types shared across the pipeline

pub mod document;
pub mod query;

pub use document::{Chunk, ChunkMetadata, DocumentMeta, FileType, VectorRecord};
pub use query::{QueryMatch, Retrieval, SourceRef};
