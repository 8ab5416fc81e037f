//! Decides which branch answers a query and, for weather, which place.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::llm::{LanguageModel, CLASSIFY_TEMPERATURE};
use crate::prompts;

static WEATHER_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:weather|temperature|forecast|humidity|rain|wind)\b").unwrap()
});

// Trigger word, optional preposition, then a run of letters and spaces.
static PLACE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:weather|temperature|climate|forecast)\s*(?:(?:in|at|for)\b)?\s*([A-Za-z\s]+)")
        .unwrap()
});

static TRAILING_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?.!]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Weather,
    DocumentQa,
    /// Reserved for a classifier that declines to choose; never produced by `route_query`.
    Unknown,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Weather => "weather",
            Route::DocumentQa => "document-qa",
            Route::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of asking the language model for a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Label(Route),
    Failure(String),
}

pub fn has_weather_keyword(query: &str) -> bool {
    WEATHER_KEYWORDS.is_match(query)
}

pub fn extract_place(query: &str) -> Option<String> {
    let caps = PLACE_PATTERN.captures(query)?;
    let raw = caps.get(1)?.as_str().trim();
    let place = TRAILING_PUNCTUATION.replace(raw, "").trim().to_string();
    if place.chars().count() >= 2 {
        Some(place)
    } else {
        None
    }
}

pub fn parse_label(reply: &str) -> Classification {
    let label = reply
        .trim()
        .trim_matches(|c: char| c == '\'' || c == '"' || c == '.' || c == '`')
        .trim()
        .to_lowercase();

    match label.as_str() {
        "weather" => Classification::Label(Route::Weather),
        "document-qa" => Classification::Label(Route::DocumentQa),
        "" => Classification::Failure("empty label".to_string()),
        other => Classification::Failure(format!("invalid label: {}", other)),
    }
}

pub async fn classify(llm: &dyn LanguageModel, query: &str) -> Classification {
    match llm
        .generate(&prompts::classification_prompt(query), CLASSIFY_TEMPERATURE)
        .await
    {
        Ok(completion) => parse_label(&completion.text),
        Err(e) => Classification::Failure(e.to_string()),
    }
}

pub async fn route_query(llm: &dyn LanguageModel, query: &str) -> (Route, Option<String>) {
    if has_weather_keyword(query) {
        tracing::debug!("Weather keyword matched, skipping classifier");
        return (Route::Weather, extract_place(query));
    }

    match classify(llm, query).await {
        Classification::Label(Route::Weather) => (Route::Weather, extract_place(query)),
        Classification::Label(_) => (Route::DocumentQa, None),
        Classification::Failure(reason) => {
            tracing::warn!("Classification failed, falling back to document-qa: {}", reason);
            (Route::DocumentQa, None)
        }
    }
}
