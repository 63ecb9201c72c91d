//! Text extraction from raw document bytes

use crate::error::{Error, Result};
use crate::types::FileType;

/// Extracted document text with optional page information
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Full extracted text
    pub text: String,
    /// Page count, when the format has pages
    pub page_count: Option<u32>,
}

/// Turns raw document bytes into text.
///
/// Extraction may fail on malformed input or produce empty text; the
/// orchestrator skips the affected document in both cases.
pub trait TextExtractor: Send + Sync {
    /// Extract text from `data`, using `filename` to pick the format.
    fn extract(&self, filename: &str, data: &[u8]) -> Result<ExtractedText>;
}

/// Default extractor for PDF, plain text, and Markdown
#[derive(Debug, Default)]
pub struct FileExtractor;

impl FileExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    #[cfg(feature = "pdf")]
    fn extract_pdf(&self, filename: &str, data: &[u8]) -> Result<ExtractedText> {
        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::extraction(filename, format!("PDF extraction failed: {}", e)))?;
        // Page count comes from the document catalog; extraction output
        // does not delimit pages reliably.
        let page_count = lopdf::Document::load_mem(data)
            .ok()
            .map(|doc| doc.get_pages().len() as u32);
        Ok(ExtractedText { text, page_count })
    }

    fn extract_utf8(&self, filename: &str, data: &[u8]) -> Result<ExtractedText> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::extraction(filename, format!("invalid UTF-8: {}", e)))?
            .to_string();
        Ok(ExtractedText {
            text,
            page_count: None,
        })
    }
}

impl TextExtractor for FileExtractor {
    fn extract(&self, filename: &str, data: &[u8]) -> Result<ExtractedText> {
        let file_type = FileType::from_name(filename)
            .ok_or_else(|| Error::extraction(filename, "unsupported file type"))?;

        match file_type {
            FileType::Pdf => {
                #[cfg(feature = "pdf")]
                {
                    self.extract_pdf(filename, data)
                }
                #[cfg(not(feature = "pdf"))]
                {
                    let _ = data;
                    Err(Error::extraction(
                        filename,
                        "PDF support disabled (enable the `pdf` feature)",
                    ))
                }
            }
            FileType::Txt | FileType::Markdown => self.extract_utf8(filename, data),
        }
    }
}
