//! Runtime settings, read once from the environment at startup.

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use crate::error::{AssistantError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing)]
    pub groq_api_key: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,

    #[serde(default, skip_serializing)]
    pub openweather_api_key: String,
    #[serde(default = "default_openweather_url")]
    pub openweather_url: String,

    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default, skip_serializing)]
    pub qdrant_api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Local directory holding an ONNX model; overrides `embedding_model` when set.
    #[serde(default)]
    pub embedding_model_dir: Option<String>,
    /// Expected vector size. The model's own size is used when unset; a mismatch is fatal.
    #[serde(default)]
    pub embedding_dimension: Option<u64>,

    #[serde(default = "default_docs_collection")]
    pub docs_collection: String,
    #[serde(default = "default_interactions_collection")]
    pub interactions_collection: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: u64,

    #[serde(default = "default_weather_timeout")]
    pub weather_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_groq_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_openweather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".to_string()
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_docs_collection() -> String {
    "docs".to_string()
}

fn default_interactions_collection() -> String {
    "interactions".to_string()
}

fn default_chunk_size() -> usize {
    1200
}

fn default_chunk_overlap() -> usize {
    120
}

fn default_retrieval_k() -> u64 {
    4
}

fn default_weather_timeout() -> u64 {
    15
}

fn default_request_timeout() -> u64 {
    10
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Settings {
    /// Load from the process environment and validate.
    pub fn from_env() -> Result<Self> {
        Self::from_source(Environment::default().try_parsing(true))
    }

    pub fn from_source(env: Environment) -> Result<Self> {
        let mut settings: Settings = Config::builder()
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AssistantError::Config(e.to_string()))?;

        settings.qdrant_api_key = settings.qdrant_api_key.filter(|k| !k.trim().is_empty());
        settings.embedding_model_dir = settings
            .embedding_model_dir
            .filter(|d| !d.trim().is_empty());

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("GROQ_API_KEY", &self.groq_api_key),
            ("OPENWEATHER_API_KEY", &self.openweather_api_key),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AssistantError::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.chunk_size == 0 {
            return Err(AssistantError::Config("CHUNK_SIZE must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AssistantError::Config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.retrieval_k == 0 {
            return Err(AssistantError::Config("RETRIEVAL_K must be positive".to_string()));
        }
        if self.embedding_dimension == Some(0) {
            return Err(AssistantError::Config(
                "EMBEDDING_DIMENSION must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
