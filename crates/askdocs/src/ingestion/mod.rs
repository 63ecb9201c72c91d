//! Document ingestion pipeline

mod extract;
mod pipeline;
mod segmenter;
mod upsert;

pub use extract::{ExtractedText, FileExtractor, TextExtractor};
pub use pipeline::{DocumentFailure, IngestReport, Ingestor};
pub use segmenter::segment;
pub use upsert::{record_id, Upserter};
