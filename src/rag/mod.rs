pub mod embeddings;
pub mod vector_store;

use std::sync::Arc;

use crate::error::Result;
use self::embeddings::Embedder;
use self::vector_store::{Passage, VectorStore};

/// Per-passage character cap applied when building a prompt context.
pub const PASSAGE_CHAR_LIMIT: usize = 1200;
pub const EMPTY_CONTEXT: &str = "(no relevant context)";
pub const PASSAGE_SEPARATOR: &str = "\n\n";

pub struct DocumentRetriever {
    embeddings: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
}

impl DocumentRetriever {
    pub fn new(
        embeddings: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embeddings,
            vector_store,
            collection: collection.into(),
        }
    }

    /// Top-`k` passages in the order the store ranked them.
    pub async fn retrieve(&self, query: &str, k: u64) -> Result<Vec<Passage>> {
        let query_embedding = self.embeddings.embed_one(query)?;
        let passages = self
            .vector_store
            .search(&self.collection, query_embedding, k)
            .await?;
        tracing::debug!("Retrieved {} passages from '{}'", passages.len(), self.collection);
        Ok(passages)
    }
}

pub fn build_context(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return EMPTY_CONTEXT.to_string();
    }

    passages
        .iter()
        .map(|p| p.text.chars().take(PASSAGE_CHAR_LIMIT).collect::<String>())
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}
