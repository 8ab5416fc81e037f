use serde::{Deserialize, Serialize};

use crate::router::Route;

// Chat-completions wire types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant messages may omit `content` (e.g. tool calls), so it stays optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

// HTTP API types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

impl AskRequest {
    /// Whitespace-only queries are rejected; others pass through untouched.
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub route: Route,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub file_name: String,
    pub chunks: usize,
    pub collection: String,
}

/// Read-only view of the running configuration, secrets excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigView {
    pub groq_model: String,
    pub qdrant_url: String,
    pub embedding_model: String,
    pub docs_collection: String,
    pub interactions_collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_queries() {
        let ask = |q: &str| AskRequest { query: q.to_string() };
        assert!(ask("").is_blank());
        assert!(ask(" \n\t").is_blank());

        let padded = ask("  weather in Pune  ");
        assert!(!padded.is_blank());
        assert_eq!(padded.query, "  weather in Pune  ");
    }
}
