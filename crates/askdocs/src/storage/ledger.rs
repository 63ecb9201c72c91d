//! Ingestion ledger: which documents were indexed, and with what fingerprint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// One successfully ingested document.
///
/// Written only after every chunk of the document has been upserted;
/// replaced wholesale on re-ingestion, never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Byte size observed at ingestion time
    pub size: u64,
    /// Modification time observed at ingestion time
    pub last_modified: DateTime<Utc>,
    /// When ingestion completed
    pub ingested_at: DateTime<Utc>,
    /// Chunks produced and upserted
    pub chunk_count: u32,
    /// Page count, when the format has pages
    pub page_count: Option<u32>,
}

/// The persisted manifest of ingested documents, keyed by filename.
///
/// Size and mtime are a coarse change signal: a modification that alters
/// neither is invisible to ingestion.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: BTreeMap<String, LedgerRecord>,
}

impl Ledger {
    /// Load the ledger from `path`. A missing or unreadable file yields an
    /// empty ledger; corruption means "start fresh", never a failure.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("no ledger at '{}' ({}), starting fresh", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(records) => Self { records },
            Err(e) => {
                tracing::warn!(
                    "ledger at '{}' is corrupt ({}), starting fresh",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Persist the ledger atomically: write to a temporary file in the same
    /// directory, then rename over the target, so readers never observe a
    /// half-written manifest.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::persistence(format!("cannot create '{}': {}", parent.display(), e)))?;

        let tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| Error::persistence(format!("cannot create temp file: {}", e)))?;
        serde_json::to_writer_pretty(tmp.as_file(), &self.records)
            .map_err(|e| Error::persistence(format!("cannot serialize ledger: {}", e)))?;
        tmp.persist(path)
            .map_err(|e| Error::persistence(format!("cannot replace '{}': {}", path.display(), e)))?;
        Ok(())
    }

    /// True iff a record exists for `name` and both size and mtime match it
    /// exactly.
    pub fn is_unchanged(&self, name: &str, size: u64, modified: DateTime<Utc>) -> bool {
        self.records
            .get(name)
            .map(|record| record.size == size && record.last_modified == modified)
            .unwrap_or(false)
    }

    /// Look up the record for `name`
    pub fn get(&self, name: &str) -> Option<&LedgerRecord> {
        self.records.get(name)
    }

    /// Insert or replace the record for `name`
    pub fn insert(&mut self, name: String, record: LedgerRecord) {
        self.records.insert(name, record);
    }

    /// Number of recorded documents
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no document has been recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in filename order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &LedgerRecord)> {
        self.records.iter()
    }
}
