//! Language-model gateway: a single `generate` call against an
//! OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::Settings;
use crate::error::{AssistantError, Result};
use crate::models::{ChatRequest, ChatResponse, Message};

/// Deterministic sampling for intent classification.
pub const CLASSIFY_TEMPERATURE: f32 = 0.0;
/// Sampling used for summaries, answers and compaction.
pub const GENERATE_TEMPERATURE: f32 = 0.2;

/// Uniform reply from the gateway.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<Completion>;
}

pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AssistantError::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.groq_base_url.trim_end_matches('/').to_string(),
            api_key: settings.groq_api_key.clone(),
            model: settings.groq_model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for GroqClient {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: Some(temperature),
            max_tokens: None,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistantError::LanguageModel(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::LanguageModel(format!(
                "{} - {}",
                status, error_text
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::LanguageModel(format!("invalid reply: {}", e)))?;

        completion_from_raw(raw)
    }
}

fn completion_from_raw(raw: serde_json::Value) -> Result<Completion> {
    let parsed: ChatResponse = serde_json::from_value(raw.clone())
        .map_err(|e| AssistantError::LanguageModel(format!("invalid reply: {}", e)))?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AssistantError::LanguageModel("reply carried no content".to_string()))?;

    Ok(Completion { text, raw })
}
