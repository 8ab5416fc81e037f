pub mod chunker;
pub mod extractor;
pub mod walker;

use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{AssistantError, Result};
use crate::rag::embeddings::Embedder;
use crate::rag::vector_store::VectorStore;
use self::chunker::chunk_text;
use self::extractor::{extract_text, extract_text_from_bytes};
use self::walker::SupportedFormat;

const EMBED_BATCH_SIZE: usize = 32;

/// Loads documents into the documents collection.
pub struct Ingestor {
    embeddings: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Ingestor {
    pub fn new(
        embeddings: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        settings: &Settings,
    ) -> Self {
        Self {
            embeddings,
            vector_store,
            collection: settings.docs_collection.clone(),
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Ingests one file; `source` is recorded in each chunk's metadata.
    pub async fn ingest_file(&self, path: &Path, source: &str) -> Result<usize> {
        let format = SupportedFormat::from_path(path).ok_or_else(|| {
            AssistantError::Ingest(format!("Unsupported file type: {}", path.display()))
        })?;
        let text = extract_text(path, format)?;
        self.ingest_text(&text, source, format).await
    }

    /// Ingests an uploaded file; its type comes from `file_name`.
    pub async fn ingest_bytes(&self, bytes: &[u8], file_name: &str) -> Result<usize> {
        let format = SupportedFormat::from_path(Path::new(file_name)).ok_or_else(|| {
            AssistantError::Ingest(format!("Unsupported file type: {}", file_name))
        })?;
        let text = extract_text_from_bytes(bytes, format)?;
        self.ingest_text(&text, file_name, format).await
    }

    pub async fn ingest_text(&self, text: &str, source: &str, format: SupportedFormat) -> Result<usize> {
        let windows = chunk_text(text, self.chunk_size, self.chunk_overlap);
        if windows.is_empty() {
            tracing::warn!("No text extracted from {}", source);
            return Ok(0);
        }

        self.vector_store
            .ensure_collection(&self.collection, self.embeddings.dimension())
            .await?;

        for batch in windows.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|w| w.text.clone()).collect();
            let vectors = self.embeddings.embed(texts)?;
            if vectors.len() != batch.len() {
                return Err(AssistantError::Embedding(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            for (window, vector) in batch.iter().zip(vectors) {
                let metadata = serde_json::json!({
                    "source": source,
                    "chunk_index": window.index,
                    "format": format.as_str(),
                });
                self.vector_store
                    .insert(&self.collection, &window.text, vector, metadata)
                    .await?;
            }
        }

        tracing::info!(
            "Ingested {} chunks from {} into '{}'",
            windows.len(),
            source,
            self.collection
        );
        Ok(windows.len())
    }
}
