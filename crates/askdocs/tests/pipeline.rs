//! End-to-end pipeline tests: filesystem corpus to grounded retrieval

use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use askdocs::config::AppConfig;
use askdocs::ingestion::{FileExtractor, Ingestor};
use askdocs::providers::{EmbeddingProvider, MemoryIndex, VectorIndex};
use askdocs::sources::FsSource;
use askdocs::{Ledger, Result, Retriever};

const DIMS: usize = 32;

/// Deterministic bag-of-words embedder: questions and chunks that share
/// vocabulary land near each other.
struct BagOfWordsEmbedder;

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; DIMS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % DIMS as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

fn test_config(root: &Path, docs: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.documents.dir = docs.to_path_buf();
    config.documents.ledger_path = root.join("ledger.json");
    config
}

fn build_ingestor(
    docs: &Path,
    embedder: Arc<BagOfWordsEmbedder>,
    index: Arc<MemoryIndex>,
    config: &AppConfig,
) -> Ingestor {
    Ingestor::new(
        Arc::new(FsSource::new(docs)),
        Arc::new(FileExtractor::new()),
        embedder,
        index,
        config,
    )
}

#[tokio::test]
async fn test_ingest_then_ask_returns_grounded_context_and_source() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    std::fs::create_dir(&docs).unwrap();
    std::fs::write(
        docs.join("leave-policy.txt"),
        "Leave policy: 20 days annual leave.",
    )
    .unwrap();

    let config = test_config(dir.path(), &docs);
    let index = Arc::new(MemoryIndex::new());
    let embedder = Arc::new(BagOfWordsEmbedder);

    let report = build_ingestor(&docs, Arc::clone(&embedder), Arc::clone(&index), &config)
        .run()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.ingested, 1);
    assert!(report.failed.is_empty());

    let ledger = Ledger::load(&config.documents.ledger_path);
    let record = ledger.get("leave-policy.txt").expect("ledger record written");
    assert_eq!(record.chunk_count, 1);

    let retriever = Retriever::new(embedder, index, &config.retrieval);
    let retrieval = retriever
        .retrieve("How many vacation days do I get?", 5)
        .await
        .unwrap();

    assert!(retrieval.match_count >= 1);
    assert!(retrieval
        .context
        .contains("Leave policy: 20 days annual leave."));
    assert_eq!(retrieval.sources.len(), 1);
    assert_eq!(retrieval.sources[0].filename, "leave-policy.txt");
}

#[tokio::test]
async fn test_second_run_skips_unchanged_documents() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    std::fs::create_dir(&docs).unwrap();
    std::fs::write(docs.join("notes.txt"), "Some indexed notes.").unwrap();

    let config = test_config(dir.path(), &docs);
    let index = Arc::new(MemoryIndex::new());
    let embedder = Arc::new(BagOfWordsEmbedder);

    let first = build_ingestor(&docs, Arc::clone(&embedder), Arc::clone(&index), &config)
        .run()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.ingested, 1);

    let second = build_ingestor(&docs, embedder, Arc::clone(&index), &config)
        .run()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.ingested, 0);
    assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn test_reingesting_a_changed_file_overwrites_its_records() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    std::fs::create_dir(&docs).unwrap();
    let path = docs.join("policy.txt");
    std::fs::write(&path, "Leave policy: 20 days annual leave.").unwrap();

    let config = test_config(dir.path(), &docs);
    let index = Arc::new(MemoryIndex::new());
    let embedder = Arc::new(BagOfWordsEmbedder);

    build_ingestor(&docs, Arc::clone(&embedder), Arc::clone(&index), &config)
        .run()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(index.len().await.unwrap(), 1);

    // different size, so the change is visible regardless of mtime
    // resolution; still one chunk, so one record is overwritten in place
    std::fs::write(&path, "Leave policy: 21 days annual leave now!").unwrap();
    let report = build_ingestor(&docs, Arc::clone(&embedder), Arc::clone(&index), &config)
        .run()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.ingested, 1);
    assert_eq!(index.len().await.unwrap(), 1);

    let retriever = Retriever::new(embedder, index, &config.retrieval);
    let retrieval = retriever.retrieve("vacation days", 3).await.unwrap();
    assert!(retrieval.context.contains("21 days"));
    assert!(!retrieval.context.contains("20 days"));
}
