//! Write-only log of compacted answers, stored for later semantic lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::rag::embeddings::Embedder;
use crate::rag::vector_store::VectorStore;

pub struct InteractionLogger {
    embeddings: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
}

impl InteractionLogger {
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

    pub async fn log(&self, summary: &str, metadata: BTreeMap<String, String>) -> Result<String> {
        self.vector_store
            .ensure_collection(&self.collection, self.embeddings.dimension())
            .await?;

        let vector = self.embeddings.embed_one(summary)?;
        let metadata = serde_json::Value::Object(
            metadata
                .into_iter()
                .map(|(key, value)| (key, serde_json::Value::String(value)))
                .collect(),
        );
        let id = self
            .vector_store
            .insert(&self.collection, summary, vector, metadata)
            .await?;

        tracing::info!("Logged interaction {} to '{}'", id, self.collection);
        Ok(id)
    }
}
