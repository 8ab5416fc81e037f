//! In-process fakes for the external services.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{AssistantError, Result};
use crate::llm::{Completion, LanguageModel};
use crate::rag::embeddings::Embedder;
use crate::rag::vector_store::{Passage, VectorStore};
use crate::weather::{WeatherProvider, WeatherRecord};

pub const TEST_DIMENSION: u64 = 8;

pub struct HashEmbedder {
    pub calls: Mutex<usize>,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        *self.calls.lock().unwrap() += 1;
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0; TEST_DIMENSION as usize];
                for (i, b) in t.bytes().enumerate() {
                    v[i % TEST_DIMENSION as usize] += b as f32;
                }
                v
            })
            .collect())
    }

    fn dimension(&self) -> u64 {
        TEST_DIMENSION
    }
}

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub text: String,
    pub metadata: JsonValue,
}

#[derive(Default)]
pub struct MemoryStore {
    pub collections: Mutex<BTreeMap<String, u64>>,
    pub records: Mutex<BTreeMap<String, Vec<StoredRecord>>>,
    pub fail_inserts: bool,
}

impl MemoryStore {
    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Default::default()
        }
    }

    pub fn records(&self, collection: &str) -> Vec<StoredRecord> {
        self.records
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed(&self, collection: &str, texts: &[&str]) {
        let mut records = self.records.lock().unwrap();
        let entries = records.entry(collection.to_string()).or_default();
        for (i, text) in texts.iter().enumerate() {
            entries.push(StoredRecord {
                id: format!("seed-{}", i),
                text: text.to_string(),
                metadata: serde_json::json!({"chunk_index": i}),
            });
        }
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn ensure_collection(&self, collection: &str, dimension: u64) -> Result<()> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_insert(dimension);
        Ok(())
    }

    async fn search(&self, collection: &str, _vector: Vec<f32>, limit: u64) -> Result<Vec<Passage>> {
        Ok(self
            .records(collection)
            .into_iter()
            .take(limit as usize)
            .enumerate()
            .map(|(i, r)| Passage {
                text: r.text,
                score: 1.0 - i as f32 * 0.1,
                metadata: r.metadata,
            })
            .collect())
    }

    async fn insert(
        &self,
        collection: &str,
        text: &str,
        _vector: Vec<f32>,
        metadata: JsonValue,
    ) -> Result<String> {
        if self.fail_inserts {
            return Err(AssistantError::VectorStore("connection refused".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        let entries = records.entry(collection.to_string()).or_default();
        let id = format!("{}-{}", collection, entries.len());
        entries.push(StoredRecord {
            id: id.clone(),
            text: text.to_string(),
            metadata,
        });
        Ok(id)
    }
}

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Answers every prompt through a closure and records what it was asked.
pub struct ScriptedModel {
    responder: Responder,
    pub prompts: Mutex<Vec<(String, f32)>>,
}

impl ScriptedModel {
    pub fn new(responder: impl Fn(&str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<(String, f32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<Completion> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), temperature));
        let text = (self.responder)(prompt)?;
        Ok(Completion {
            text,
            raw: JsonValue::Null,
        })
    }
}

pub struct RecordingWeather {
    pub places: Mutex<Vec<String>>,
    reply: Option<JsonValue>,
}

impl RecordingWeather {
    pub fn returning(raw: JsonValue) -> Self {
        Self {
            places: Mutex::new(Vec::new()),
            reply: Some(raw),
        }
    }

    pub fn failing() -> Self {
        Self {
            places: Mutex::new(Vec::new()),
            reply: None,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.places.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for RecordingWeather {
    async fn current(&self, place: &str) -> Result<WeatherRecord> {
        self.places.lock().unwrap().push(place.to_string());
        match &self.reply {
            Some(raw) => WeatherRecord::from_json(raw.clone()),
            None => Err(AssistantError::WeatherLookup(
                "404 Not Found - city not found".to_string(),
            )),
        }
    }
}
