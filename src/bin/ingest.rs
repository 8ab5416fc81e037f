use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use weather_docs_assistant::indexer::walker::{walk_directory, SupportedFormat};
use weather_docs_assistant::indexer::Ingestor;
use weather_docs_assistant::logging;
use weather_docs_assistant::rag::embeddings::{Embedder, FastEmbedder};
use weather_docs_assistant::rag::vector_store::{QdrantStore, VectorStore};
use weather_docs_assistant::Settings;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Load documents into the assistant's document collection")]
struct Args {
    /// File or directory to ingest (PDF, text, markdown)
    path: PathBuf,

    /// Target collection (defaults to DOCS_COLLECTION)
    #[arg(long)]
    collection: Option<String>,
}

fn collect_files(path: &Path) -> Result<Vec<(PathBuf, SupportedFormat)>> {
    if path.is_dir() {
        return Ok(walk_directory(path));
    }
    match SupportedFormat::from_path(path) {
        Some(format) => Ok(vec![(path.to_path_buf(), format)]),
        None => anyhow::bail!("Unsupported file type: {}", path.display()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let settings = Settings::from_env()?;

    if !args.path.exists() {
        anyhow::bail!("Path does not exist: {}", args.path.display());
    }

    let files = collect_files(&args.path)?;
    println!("Found {} supported files", files.len());
    if files.is_empty() {
        return Ok(());
    }

    println!("Initializing embedding model...");
    let embeddings: Arc<dyn Embedder> = Arc::new(FastEmbedder::new(&settings)?);

    println!("Connecting to Qdrant at {}...", settings.qdrant_url);
    let vector_store: Arc<dyn VectorStore> = Arc::new(QdrantStore::connect(&settings)?);

    let mut ingestor = Ingestor::new(embeddings, vector_store, &settings);
    if let Some(collection) = args.collection {
        ingestor = ingestor.with_collection(collection);
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut total_chunks = 0usize;
    let mut failed_files: Vec<(PathBuf, String)> = Vec::new();

    for (path, _) in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        pb.set_message(name);

        match ingestor.ingest_file(path, &path.to_string_lossy()).await {
            Ok(chunks) => total_chunks += chunks,
            Err(e) => {
                tracing::warn!("Failed to ingest {}: {}", path.display(), e);
                failed_files.push((path.clone(), e.to_string()));
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("done");

    println!("\nIngestion complete!");
    println!("  Files ingested: {}/{}", files.len() - failed_files.len(), files.len());
    println!("  Total chunks:   {}", total_chunks);
    println!("  Collection:     {}", ingestor.collection());

    if !failed_files.is_empty() {
        println!("\nFailed files:");
        for (path, err) in &failed_files {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}
