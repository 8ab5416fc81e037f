//! Current-conditions lookup against the OpenWeatherMap API.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::{AssistantError, Result};

pub const UNITS: &str = "metric";
pub const LANG: &str = "en";

static FILLER_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:now|today|current|weather|in)\b").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lower-cases the place, drops filler words and collapses whitespace.
pub fn normalize_place(place: &str) -> String {
    let lowered = place.trim().to_lowercase();
    let stripped = FILLER_WORDS.replace_all(&lowered, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Upstream reply, passed through to the summarizer as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub raw: serde_json::Value,
}

impl WeatherRecord {
    /// Requires at least `main.temp`; nothing else is checked.
    pub fn from_json(raw: serde_json::Value) -> Result<Self> {
        if raw.pointer("/main/temp").and_then(|t| t.as_f64()).is_none() {
            return Err(AssistantError::WeatherLookup(
                "reply has no temperature field".to_string(),
            ));
        }
        Ok(Self { raw })
    }

    pub fn place(&self) -> Option<&str> {
        self.raw.get("name").and_then(|n| n.as_str())
    }

    pub fn temperature(&self) -> Option<f64> {
        self.raw.pointer("/main/temp").and_then(|t| t.as_f64())
    }

    pub fn description(&self) -> Option<&str> {
        self.raw
            .pointer("/weather/0/description")
            .and_then(|d| d.as_str())
    }

    pub fn humidity(&self) -> Option<f64> {
        self.raw.pointer("/main/humidity").and_then(|h| h.as_f64())
    }

    pub fn wind_speed(&self) -> Option<f64> {
        self.raw.pointer("/wind/speed").and_then(|w| w.as_f64())
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// `place` is expected to be normalized already.
    async fn current(&self, place: &str) -> Result<WeatherRecord>;
}

pub struct OpenWeatherClient {
    client: Client,
    url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.weather_timeout_secs))
            .build()
            .map_err(|e| AssistantError::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            url: settings.openweather_url.clone(),
            api_key: settings.openweather_api_key.clone(),
        })
    }

    pub fn query_params<'a>(&'a self, place: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("q", place),
            ("appid", self.api_key.as_str()),
            ("units", UNITS),
            ("lang", LANG),
        ]
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, place: &str) -> Result<WeatherRecord> {
        tracing::info!("Fetching current weather for '{}'", place);

        let response = self
            .client
            .get(&self.url)
            .query(&self.query_params(place))
            .send()
            .await
            .map_err(|e| AssistantError::WeatherLookup(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::WeatherLookup(format!(
                "{} - {}",
                status, error_text
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::WeatherLookup(format!("invalid reply: {}", e)))?;

        WeatherRecord::from_json(raw)
    }
}
