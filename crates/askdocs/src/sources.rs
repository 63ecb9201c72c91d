//! Document sources for ingestion scans

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::error::Result;
use crate::types::{DocumentMeta, FileType};

/// A collection of documents the pipeline can scan and read.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Enumerate candidate documents with their change signal (size, mtime).
    async fn list(&self) -> Result<Vec<DocumentMeta>>;

    /// Read one document's raw bytes.
    async fn read(&self, name: &str) -> Result<Vec<u8>>;
}

/// Filesystem source scanning a directory tree for supported files
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentSource for FsSource {
    async fn list(&self) -> Result<Vec<DocumentMeta>> {
        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = match entry.path().strip_prefix(&self.root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            if FileType::from_name(&name).is_none() {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!("skipping '{}': cannot stat: {}", name, e);
                    continue;
                }
            };
            let modified = match metadata.modified() {
                Ok(mtime) => DateTime::<Utc>::from(mtime),
                Err(e) => {
                    tracing::warn!("skipping '{}': no modification time: {}", name, e);
                    continue;
                }
            };
            documents.push(DocumentMeta {
                name,
                size: metadata.len(),
                modified,
            });
        }

        // Stable scan order keeps runs comparable in the logs.
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(documents)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.root.join(name)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_unsupported_files_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"bbb").unwrap();
        std::fs::write(dir.path().join("a.md"), b"aaa").unwrap();
        std::fs::write(dir.path().join("ignore.bin"), b"\x00").unwrap();

        let source = FsSource::new(dir.path());
        let documents = source.list().await.unwrap();

        let names: Vec<&str> = documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.txt"]);
        assert_eq!(documents[1].size, 3);
    }

    #[tokio::test]
    async fn test_read_returns_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.txt"), b"content").unwrap();

        let source = FsSource::new(dir.path());
        assert_eq!(source.read("doc.txt").await.unwrap(), b"content");
        assert!(source.read("missing.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_list_recurses_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("deep.txt"), b"deep").unwrap();

        let source = FsSource::new(dir.path());
        let documents = source.list().await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].name, "sub/deep.txt");
        assert_eq!(source.read("sub/deep.txt").await.unwrap(), b"deep");
    }
}
