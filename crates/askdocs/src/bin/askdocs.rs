//! askdocs command line: ingest documents, ask questions, inspect the ledger

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use askdocs::config::IndexBackend;
use askdocs::ingestion::FileExtractor;
use askdocs::providers::{
    AnswerGenerator, MemoryIndex, OllamaClient, OllamaEmbedder, OllamaGenerator, RemoteIndex,
    VectorIndex,
};
use askdocs::sources::FsSource;
use askdocs::{AppConfig, Ingestor, Ledger, PromptBuilder, Retriever};

#[derive(Parser)]
#[command(name = "askdocs", about = "Document Q&A over a vector index", version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the document directory and index changed documents
    Ingest {
        /// Document directory (overrides the config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Ask a question against the indexed corpus
    Ask {
        /// The question
        question: String,
        /// Number of passages to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show what the ledger has recorded
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Ingest { dir } => {
            if let Some(dir) = dir {
                config.documents.dir = dir;
            }
            config.validate().context("validating configuration")?;
            ingest(&config).await
        }
        Command::Ask { question, top_k } => {
            config.validate().context("validating configuration")?;
            ask(&config, &question, top_k).await
        }
        Command::Status => status(&config),
    }
}

fn build_index(config: &AppConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    match config.index.backend {
        IndexBackend::Memory => {
            tracing::warn!("memory index selected: records do not persist across processes");
            Ok(Arc::new(MemoryIndex::new()))
        }
        IndexBackend::Remote => {
            let endpoint = config.index.endpoint.as_deref().unwrap_or_default();
            let api_key = config.index.api_key.as_deref().unwrap_or_default();
            Ok(Arc::new(RemoteIndex::new(
                endpoint,
                api_key,
                config.llm.timeout_secs,
            )?))
        }
    }
}

async fn ingest(config: &AppConfig) -> anyhow::Result<()> {
    let index = build_index(config)?;
    let embedder = Arc::new(OllamaEmbedder::new(
        &config.llm,
        config.embedding.dimensions,
    )?);
    let ingestor = Ingestor::new(
        Arc::new(FsSource::new(config.documents.dir.clone())),
        Arc::new(FileExtractor::new()),
        embedder,
        index,
        config,
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!(
        "indexing documents from {}",
        config.documents.dir.display()
    ));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = ingestor.run().await?;
    spinner.finish_and_clear();

    let Some(report) = report else {
        bail!("another ingestion run is already in flight");
    };

    println!(
        "{} {} ingested, {} skipped, {} failed",
        style("done:").green().bold(),
        report.ingested,
        report.skipped,
        report.failed.len()
    );
    for failure in &report.failed {
        println!(
            "  {} {}: {}",
            style("failed").red(),
            failure.name,
            failure.error
        );
    }
    Ok(())
}

async fn ask(config: &AppConfig, question: &str, top_k: Option<usize>) -> anyhow::Result<()> {
    let index = build_index(config)?;
    let client = Arc::new(OllamaClient::new(&config.llm)?);
    let embedder = Arc::new(OllamaEmbedder::from_client(
        Arc::clone(&client),
        config.embedding.dimensions,
    ));
    let generator = OllamaGenerator::from_client(client);
    let retriever = Retriever::new(embedder, index, &config.retrieval);

    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let retrieval = retriever.retrieve(question, top_k).await?;

    if retrieval.is_empty() {
        println!(
            "{}",
            style("No indexed content matched the question.").yellow()
        );
        return Ok(());
    }

    let prompt = PromptBuilder::build(question, &retrieval);
    let answer = generator.generate(&prompt).await?;

    println!("{}\n", answer.trim());
    println!("{}", style("Sources:").bold());
    for (i, source) in retrieval.sources.iter().enumerate() {
        println!(
            "  [{}] {} (score {:.2})",
            i + 1,
            source.filename,
            source.score
        );
    }
    Ok(())
}

fn status(config: &AppConfig) -> anyhow::Result<()> {
    let ledger = Ledger::load(&config.documents.ledger_path);
    if ledger.is_empty() {
        println!("No documents ingested yet.");
        return Ok(());
    }

    println!(
        "{} document(s) in {}",
        ledger.len(),
        config.documents.ledger_path.display()
    );
    for (name, record) in ledger.iter() {
        let pages = record
            .page_count
            .map(|p| format!(", {} page(s)", p))
            .unwrap_or_default();
        println!(
            "  {} {} chunk(s){}, ingested {}",
            style(name).bold(),
            record.chunk_count,
            pages,
            record.ingested_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
