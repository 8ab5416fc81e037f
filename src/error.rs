use thiserror::Error;

/// Errors raised while answering a query or ingesting documents.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not infer a city from the query. Try asking: 'What's the weather in <city>?'")]
    MissingPlace,

    #[error("Weather lookup failed: {0}")]
    WeatherLookup(String),

    #[error("Language model request failed: {0}")]
    LanguageModel(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store request failed: {0}")]
    VectorStore(String),

    #[error("Ingestion failed: {0}")]
    Ingest(String),
}

impl AssistantError {
    /// Text shown to the user in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::MissingPlace => self.to_string(),
            other => format!("❌ Error: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
