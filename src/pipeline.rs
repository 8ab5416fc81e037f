//! Per-query orchestration: route, run one branch, then compact and log.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{AssistantError, Result};
use crate::interactions::InteractionLogger;
use crate::llm::{GroqClient, LanguageModel, GENERATE_TEMPERATURE};
use crate::prompts;
use crate::rag::embeddings::Embedder;
use crate::rag::vector_store::VectorStore;
use crate::rag::{build_context, DocumentRetriever};
use crate::router::{self, Route};
use crate::weather::{normalize_place, OpenWeatherClient, WeatherProvider};

pub const NO_ANSWER: &str = "(No answer)";

/// Everything produced while answering one query.
#[derive(Debug, Clone)]
pub struct Turn {
    pub route: Route,
    pub place: Option<String>,
    pub answer: Option<String>,
    pub interaction_id: Option<String>,
}

pub struct Assistant {
    llm: Arc<dyn LanguageModel>,
    weather: Arc<dyn WeatherProvider>,
    retriever: DocumentRetriever,
    interactions: InteractionLogger,
    retrieval_k: u64,
}

impl Assistant {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        weather: Arc<dyn WeatherProvider>,
        retriever: DocumentRetriever,
        interactions: InteractionLogger,
        retrieval_k: u64,
    ) -> Self {
        Self {
            llm,
            weather,
            retriever,
            interactions,
            retrieval_k,
        }
    }

    /// Wires the production clients from settings, sharing one embedder and store.
    pub fn from_settings(
        settings: &Settings,
        embeddings: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let llm: Arc<dyn LanguageModel> = Arc::new(GroqClient::new(settings)?);
        let weather: Arc<dyn WeatherProvider> = Arc::new(OpenWeatherClient::new(settings)?);
        let retriever = DocumentRetriever::new(
            embeddings.clone(),
            vector_store.clone(),
            settings.docs_collection.clone(),
        );
        let interactions = InteractionLogger::new(
            embeddings,
            vector_store,
            settings.interactions_collection.clone(),
        );

        Ok(Self::new(llm, weather, retriever, interactions, settings.retrieval_k))
    }

    pub async fn handle_weather(&self, query: &str, place: Option<&str>) -> Result<String> {
        let place = place.ok_or(AssistantError::MissingPlace)?;
        let normalized = normalize_place(place);
        if normalized.is_empty() {
            return Err(AssistantError::MissingPlace);
        }

        let record = self.weather.current(&normalized).await?;
        tracing::debug!(
            "Weather for {:?}: {:?}°C, {:?}",
            record.place(),
            record.temperature(),
            record.description()
        );
        let completion = self
            .llm
            .generate(
                &prompts::weather_summary_prompt(&record.raw, query),
                GENERATE_TEMPERATURE,
            )
            .await?;
        Ok(completion.text)
    }

    pub async fn handle_document_qa(&self, query: &str) -> Result<String> {
        let passages = self.retriever.retrieve(query, self.retrieval_k).await?;
        let context = build_context(&passages);
        let completion = self
            .llm
            .generate(
                &prompts::document_answer_prompt(&context, query),
                GENERATE_TEMPERATURE,
            )
            .await?;
        Ok(completion.text)
    }

    /// Compacts the answer and persists it. Returns the record id on success;
    /// failures are logged and never reach the caller.
    async fn finalize(&self, query: &str, route: Route, answer: &str) -> Option<String> {
        let compact = match self
            .llm
            .generate(&prompts::compaction_prompt(answer), GENERATE_TEMPERATURE)
            .await
        {
            Ok(completion) => completion.text,
            Err(e) => {
                tracing::warn!("Compaction failed, interaction not logged: {}", e);
                return None;
            }
        };

        let metadata = BTreeMap::from([
            ("route".to_string(), route.as_str().to_string()),
            ("query".to_string(), query.to_string()),
        ]);

        match self.interactions.log(&compact, metadata).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Interaction logging failed: {}", e);
                None
            }
        }
    }

    pub async fn run(&self, query: &str) -> Result<Turn> {
        let (route, place) = self.route(query).await;
        self.execute(query, route, place).await
    }

    /// Like `run`, but a failed branch turns into the reply text.
    pub async fn respond(&self, query: &str) -> Turn {
        let (route, place) = self.route(query).await;
        match self.execute(query, route, place.clone()).await {
            Ok(turn) => turn,
            Err(e) => {
                tracing::error!("Query failed on {} branch: {}", route, e);
                Turn {
                    route,
                    place,
                    answer: Some(e.user_message()),
                    interaction_id: None,
                }
            }
        }
    }

    async fn route(&self, query: &str) -> (Route, Option<String>) {
        let (route, place) = router::route_query(self.llm.as_ref(), query).await;
        tracing::info!("Routed query to {} (place: {:?})", route, place);
        (route, place)
    }

    async fn execute(&self, query: &str, route: Route, place: Option<String>) -> Result<Turn> {
        let answer = match route {
            Route::Weather => self.handle_weather(query, place.as_deref()).await?,
            Route::DocumentQa => self.handle_document_qa(query).await?,
            Route::Unknown => {
                return Ok(Turn {
                    route,
                    place,
                    answer: None,
                    interaction_id: None,
                })
            }
        };

        let interaction_id = self.finalize(query, route, &answer).await;

        Ok(Turn {
            route,
            place,
            answer: Some(answer),
            interaction_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{HashEmbedder, MemoryStore, RecordingWeather, ScriptedModel};
    use serde_json::json;

    const SUMMARY: &str = "It is 31°C and humid in Mumbai with light haze.";
    const NOTE: &str = "Mumbai: 31°C, humid, hazy.";

    fn mumbai() -> serde_json::Value {
        json!({
            "name": "Mumbai",
            "main": {"temp": 31.0, "humidity": 74},
            "weather": [{"description": "haze"}],
            "wind": {"speed": 4.1}
        })
    }

    /// Replies by prompt type; classification answers `label`.
    fn model(label: &'static str) -> ScriptedModel {
        ScriptedModel::new(move |prompt| {
            if prompt.starts_with("Classify") {
                Ok(label.to_string())
            } else if prompt.contains("Weather JSON") {
                Ok(SUMMARY.to_string())
            } else if prompt.starts_with("Summarize the following response") {
                Ok(NOTE.to_string())
            } else {
                Ok("Retrieval pairs search with generation.".to_string())
            }
        })
    }

    struct Harness {
        llm: Arc<ScriptedModel>,
        weather: Arc<RecordingWeather>,
        store: Arc<MemoryStore>,
        assistant: Assistant,
    }

    fn harness(llm: ScriptedModel, weather: RecordingWeather, store: MemoryStore) -> Harness {
        let llm = Arc::new(llm);
        let weather = Arc::new(weather);
        let store = Arc::new(store);
        let embeddings: Arc<dyn Embedder> = Arc::new(HashEmbedder::new());
        let assistant = Assistant::new(
            llm.clone(),
            weather.clone(),
            DocumentRetriever::new(embeddings.clone(), store.clone(), "docs"),
            InteractionLogger::new(embeddings, store.clone(), "interactions"),
            4,
        );
        Harness {
            llm,
            weather,
            store,
            assistant,
        }
    }

    #[tokio::test]
    async fn test_weather_end_to_end() {
        let h = harness(model("document-qa"), RecordingWeather::returning(mumbai()), MemoryStore::default());
        let query = "What's the weather in Mumbai?";

        let turn = h.assistant.run(query).await.unwrap();

        assert_eq!(turn.route, Route::Weather);
        assert_eq!(turn.place.as_deref(), Some("Mumbai"));
        assert_eq!(h.weather.calls(), vec!["mumbai".to_string()]);
        assert_eq!(turn.answer.as_deref(), Some(SUMMARY));

        let logged = h.store.records("interactions");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].text, NOTE);
        assert_eq!(logged[0].metadata, json!({"route": "weather", "query": query}));
        assert_eq!(turn.interaction_id.as_deref(), Some(logged[0].id.as_str()));

        let prompts = h.llm.prompts();
        assert!(!prompts.iter().any(|(p, _)| p.starts_with("Classify")));
        assert!(prompts.iter().all(|(_, t)| *t == GENERATE_TEMPERATURE));
    }

    #[tokio::test]
    async fn test_missing_place_fails_before_weather_call() {
        let h = harness(model("weather"), RecordingWeather::returning(mumbai()), MemoryStore::default());

        let err = h.assistant.handle_weather("tell me weather", None).await.unwrap_err();
        assert!(matches!(err, AssistantError::MissingPlace));

        let turn = h.assistant.respond("tell me weather").await;
        assert_eq!(turn.route, Route::Weather);
        assert!(turn.answer.unwrap().contains("city"));

        assert!(h.weather.calls().is_empty());
        assert!(h.store.records("interactions").is_empty());
    }

    #[tokio::test]
    async fn test_place_of_only_filler_words_is_missing() {
        let h = harness(model("weather"), RecordingWeather::returning(mumbai()), MemoryStore::default());
        let err = h.assistant.handle_weather("weather in", Some("in")).await.unwrap_err();
        assert!(matches!(err, AssistantError::MissingPlace));
        assert!(h.weather.calls().is_empty());
    }

    #[tokio::test]
    async fn test_weather_upstream_failure_becomes_reply() {
        let h = harness(model("weather"), RecordingWeather::failing(), MemoryStore::default());

        let turn = h.assistant.respond("weather in Atlantis").await;

        assert_eq!(turn.place.as_deref(), Some("Atlantis"));
        assert!(turn.answer.unwrap().starts_with("❌ Error: Weather lookup failed"));
        assert!(turn.interaction_id.is_none());
        assert_eq!(h.weather.calls(), vec!["atlantis".to_string()]);
        assert!(h.store.records("interactions").is_empty());
    }

    #[tokio::test]
    async fn test_document_qa_with_no_passages_still_answers() {
        let h = harness(model("document-qa"), RecordingWeather::failing(), MemoryStore::default());

        let turn = h.assistant.run("Summarize the PDF's main contribution.").await.unwrap();

        assert_eq!(turn.route, Route::DocumentQa);
        assert!(turn.place.is_none());
        assert!(!turn.answer.unwrap().is_empty());

        let prompts = h.llm.prompts();
        let answer_prompt = prompts
            .iter()
            .find(|(p, _)| p.contains("Context:"))
            .map(|(p, _)| p.clone())
            .unwrap();
        assert!(answer_prompt.contains("(no relevant context)"));
        assert_eq!(prompts[0].1, crate::llm::CLASSIFY_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_document_qa_uses_top_k_in_order() {
        let store = MemoryStore::default();
        let passages: Vec<String> = (0..6).map(|i| format!("passage {}", i)).collect();
        let refs: Vec<&str> = passages.iter().map(|s| s.as_str()).collect();
        store.seed("docs", &refs);
        let h = harness(model("document-qa"), RecordingWeather::failing(), store);

        h.assistant.handle_document_qa("What does the paper propose?").await.unwrap();

        let (prompt, _) = h
            .llm
            .prompts()
            .into_iter()
            .find(|(p, _)| p.contains("Context:"))
            .unwrap();
        assert!(prompt.contains("passage 0\n\npassage 1\n\npassage 2\n\npassage 3"));
        assert!(!prompt.contains("passage 4"));
    }

    #[tokio::test]
    async fn test_classifier_failure_routes_to_documents() {
        let llm = ScriptedModel::new(|prompt| {
            if prompt.starts_with("Classify") {
                Err(AssistantError::LanguageModel("LLM down".to_string()))
            } else {
                Ok("An answer.".to_string())
            }
        });
        let h = harness(llm, RecordingWeather::returning(mumbai()), MemoryStore::default());

        let turn = h
            .assistant
            .run("Explain section 2 of the document about retrieval.")
            .await
            .unwrap();

        assert_eq!(turn.route, Route::DocumentQa);
        assert!(turn.place.is_none());
        assert!(h.weather.calls().is_empty());
        let logged = h.store.records("interactions");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].metadata["route"], "document-qa");
    }

    #[tokio::test]
    async fn test_logging_failure_does_not_affect_answer() {
        let h = harness(
            model("document-qa"),
            RecordingWeather::returning(mumbai()),
            MemoryStore::failing_inserts(),
        );

        let turn = h.assistant.respond("weather in Mumbai").await;

        assert_eq!(turn.answer.as_deref(), Some(SUMMARY));
        assert!(turn.interaction_id.is_none());
    }

    #[tokio::test]
    async fn test_compaction_failure_does_not_affect_answer() {
        let llm = ScriptedModel::new(|prompt| {
            if prompt.starts_with("Summarize the following response") {
                Err(AssistantError::LanguageModel("rate limited".to_string()))
            } else {
                Ok(SUMMARY.to_string())
            }
        });
        let h = harness(llm, RecordingWeather::returning(mumbai()), MemoryStore::default());

        let turn = h.assistant.respond("temperature at London?").await;

        assert_eq!(turn.answer.as_deref(), Some(SUMMARY));
        assert_eq!(h.weather.calls(), vec!["london".to_string()]);
        assert!(h.store.records("interactions").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_ends_without_answer() {
        let h = harness(model("weather"), RecordingWeather::returning(mumbai()), MemoryStore::default());

        let turn = h
            .assistant
            .execute("What's the weather in Mumbai?", Route::Unknown, None)
            .await
            .unwrap();

        assert_eq!(turn.route, Route::Unknown);
        assert!(turn.answer.is_none());
        assert!(turn.interaction_id.is_none());
        assert!(h.llm.prompts().is_empty());
        assert!(h.weather.calls().is_empty());
        assert!(h.store.records("interactions").is_empty());
    }

    #[tokio::test]
    async fn test_logged_query_is_verbatim() {
        let h = harness(model("document-qa"), RecordingWeather::returning(mumbai()), MemoryStore::default());
        let query = "  weather in Mumbai?  ";

        let turn = h.assistant.respond(query).await;

        assert_eq!(turn.answer.as_deref(), Some(SUMMARY));
        let logged = h.store.records("interactions");
        assert_eq!(logged[0].metadata["query"], json!(query));
    }
}
