use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use weather_docs_assistant::history::{ConversationHistory, Exchange};
use weather_docs_assistant::indexer::Ingestor;
use weather_docs_assistant::logging;
use weather_docs_assistant::models::{AskRequest, AskResponse, ConfigView, IngestResponse};
use weather_docs_assistant::pipeline::{Assistant, NO_ANSWER};
use weather_docs_assistant::rag::embeddings::{Embedder, FastEmbedder};
use weather_docs_assistant::rag::vector_store::{QdrantStore, VectorStore};
use weather_docs_assistant::Settings;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

struct AppState {
    /// Held for the whole query so one query finishes before the next starts.
    assistant: Mutex<Assistant>,
    history: Mutex<ConversationHistory>,
    ingestor: Ingestor,
    config_view: ConfigView,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let settings = Settings::from_env()?;

    tracing::info!("Using model: {}", settings.groq_model);
    tracing::info!("Connecting to Qdrant: {}", settings.qdrant_url);

    let embeddings: Arc<dyn Embedder> = Arc::new(FastEmbedder::new(&settings)?);
    let vector_store: Arc<dyn VectorStore> = Arc::new(QdrantStore::connect(&settings)?);

    let assistant = Assistant::from_settings(&settings, embeddings.clone(), vector_store.clone())?;
    let ingestor = Ingestor::new(embeddings, vector_store, &settings);

    let state = Arc::new(AppState {
        assistant: Mutex::new(assistant),
        history: Mutex::new(ConversationHistory::default()),
        ingestor,
        config_view: ConfigView {
            groq_model: settings.groq_model.clone(),
            qdrant_url: settings.qdrant_url.clone(),
            embedding_model: settings.embedding_model.clone(),
            docs_collection: settings.docs_collection.clone(),
            interactions_collection: settings.interactions_collection.clone(),
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        },
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/v1/chat", post(chat_handler))
        .route("/api/v1/documents", post(ingest_handler))
        .route("/api/v1/history", get(history_handler))
        .route("/api/v1/config", get(config_handler))
        .route("/api/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("Assistant listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    if request.is_blank() {
        return Err((StatusCode::BAD_REQUEST, "Query must not be empty".to_string()));
    }

    let assistant = state.assistant.lock().await;
    let turn = assistant.respond(&request.query).await;
    let answer = turn.answer.unwrap_or_else(|| NO_ANSWER.to_string());
    state
        .history
        .lock()
        .await
        .record(request.query, answer.clone());

    Ok(Json(AskResponse {
        answer,
        route: turn.route,
        place: turn.place,
    }))
}

async fn history_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Exchange>> {
    Json(state.history.lock().await.recent())
}

async fn ingest_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(|n| n.to_string()) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)))?;

        let chunks = state
            .ingestor
            .ingest_bytes(&bytes, &file_name)
            .await
            .map_err(|e| {
                tracing::error!("Ingestion error: {}", e);
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            })?;

        return Ok(Json(IngestResponse {
            file_name,
            chunks,
            collection: state.ingestor.collection().to_string(),
        }));
    }

    Err((StatusCode::BAD_REQUEST, "No file in upload".to_string()))
}

async fn config_handler(State(state): State<Arc<AppState>>) -> Json<ConfigView> {
    Json(state.config_view.clone())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
