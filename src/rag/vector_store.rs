use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::{Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{AssistantError, Result};

/// A stored text with its similarity score, in store order.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub text: String,
    pub score: f32,
    pub metadata: JsonValue,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates the collection when absent; a no-op otherwise.
    async fn ensure_collection(&self, collection: &str, dimension: u64) -> Result<()>;

    async fn search(&self, collection: &str, vector: Vec<f32>, limit: u64) -> Result<Vec<Passage>>;

    /// Appends a new record and returns its id. Never overwrites.
    async fn insert(
        &self,
        collection: &str,
        text: &str,
        vector: Vec<f32>,
        metadata: JsonValue,
    ) -> Result<String>;
}

pub struct QdrantStore {
    client: Qdrant,
}

fn store_err(e: impl std::fmt::Display) -> AssistantError {
    AssistantError::VectorStore(e.to_string())
}

impl QdrantStore {
    pub fn connect(settings: &Settings) -> Result<Self> {
        tracing::info!("Building Qdrant client for URL: {}", settings.qdrant_url);
        let mut builder = Qdrant::from_url(&settings.qdrant_url)
            .timeout(Duration::from_secs(settings.request_timeout_secs));
        if let Some(key) = &settings.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }

        let client = builder.build().map_err(|e| {
            tracing::error!("Qdrant client build failed: {:?}", e);
            store_err(e)
        })?;

        Ok(Self { client })
    }
}

pub fn payload_for(text: &str, metadata: JsonValue) -> JsonMap<String, JsonValue> {
    let mut payload_map = JsonMap::new();
    payload_map.insert("text".to_string(), JsonValue::String(text.to_string()));
    payload_map.insert("metadata".to_string(), metadata);
    payload_map
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, collection: &str, dimension: u64) -> Result<()> {
        if !self
            .client
            .collection_exists(collection)
            .await
            .map_err(store_err)?
        {
            tracing::info!("Creating Qdrant collection '{}' (dim {})", collection, dimension);
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(collection)
                        .vectors_config(VectorParamsBuilder::new(dimension, Distance::Cosine)),
                )
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }

    async fn search(&self, collection: &str, vector: Vec<f32>, limit: u64) -> Result<Vec<Passage>> {
        let search_result = self
            .client
            .search_points(SearchPointsBuilder::new(collection, vector, limit).with_payload(true))
            .await
            .map_err(store_err)?;

        let mut results = Vec::new();
        for point in search_result.result {
            let Some(text) = point.payload.get("text").and_then(|t| t.as_str()) else {
                continue;
            };
            let metadata = point
                .payload
                .get("metadata")
                .cloned()
                .map(|m| m.into_json())
                .unwrap_or(JsonValue::Null);
            results.push(Passage {
                text: text.to_string(),
                score: point.score,
                metadata,
            });
        }

        Ok(results)
    }

    async fn insert(
        &self,
        collection: &str,
        text: &str,
        vector: Vec<f32>,
        metadata: JsonValue,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let point = PointStruct::new(id.clone(), vector, payload_for(text, metadata));

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, vec![point]).wait(true))
            .await
            .map_err(store_err)?;

        Ok(id)
    }
}
