//! HTTP API server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/process-text` | Structure a text and file it under a topic |
//! | `GET`  | `/api/topics` | List topics, most recently updated first |
//! | `GET`  | `/api/topics/search?query=` | Case-insensitive substring search on topic names |
//! | `GET`  | `/api/topics/{topicId}/texts` | Texts filed under a topic, newest first |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! When `[server].static_dir` is set, every other path is served from that
//! directory, so the single-page frontend and the API share one origin.
//!
//! # Error Contract
//!
//! Failures return a JSON body with a human-readable message and no error
//! code:
//!
//! ```json
//! { "message": "Invalid topic ID" }
//! ```
//!
//! Status codes: 400 invalid input, 429 AI quota exhausted, 500 credential or
//! database problems, 503 AI service unreachable. See [`AppError`].
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::ai::{self, Structurer};
use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::migrate;
use crate::models::{ProcessedText, Topic};
use crate::process::{process_text, ProcessOutcome};
use crate::repository::Repository;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub structurer: Arc<Structurer>,
}

impl AppState {
    pub fn new(repo: Repository, structurer: Structurer) -> Self {
        Self {
            repo,
            structurer: Arc::new(structurer),
        }
    }
}

/// Starts the HTTP server on `[server].bind`.
///
/// Connects to the database, applies migrations, builds the AI model from
/// `[ai]`, and serves until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let model = ai::create_model(&config.ai)?;
    tracing::info!(model = model.name(), "AI model ready");

    let state = AppState::new(Repository::new(pool), Structurer::new(model, &config.ai));
    let app = router(state, config.server.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

/// Build the router. `static_dir`, if given, serves unmatched paths.
pub fn router(state: AppState, static_dir: Option<&std::path::Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/api/process-text", post(handle_process_text))
        .route("/api/topics", get(handle_list_topics))
        .route("/api/topics/search", get(handle_search_topics))
        .route("/api/topics/{topic_id}/texts", get(handle_texts_by_topic))
        .route("/health", get(handle_health));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/process-text ============

/// Handler for `POST /api/process-text`.
///
/// Body: `{ "text": string, "topic"?: string }`. The shape is checked by hand
/// rather than through a typed `Json<T>` so that a missing or non-string
/// `text` is a 400 with our message, not Axum's 422.
async fn handle_process_text(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProcessOutcome>, AppError> {
    let Json(body) =
        body.map_err(|e| AppError::Validation(format!("Invalid request body: {}", e.body_text())))?;

    let text = match body.get("text") {
        Some(Value::String(text)) => text.as_str(),
        _ => {
            return Err(AppError::Validation(
                "Please provide valid text to analyze".to_string(),
            ))
        }
    };

    let topic = match body.get("topic") {
        None | Some(Value::Null) => None,
        Some(Value::String(topic)) => Some(topic.as_str()),
        Some(_) => return Err(AppError::Validation("topic must be a string".to_string())),
    };

    let outcome = process_text(&state.repo, &state.structurer, text, topic).await?;
    Ok(Json(outcome))
}

// ============ GET /api/topics ============

#[derive(Serialize)]
struct TopicsResponse {
    topics: Vec<Topic>,
}

async fn handle_list_topics(
    State(state): State<AppState>,
) -> Result<Json<TopicsResponse>, AppError> {
    let topics = state.repo.get_all_topics().await?;
    Ok(Json(TopicsResponse { topics }))
}

// ============ GET /api/topics/search ============

#[derive(Deserialize)]
struct SearchParams {
    query: Option<String>,
}

/// Handler for `GET /api/topics/search?query=`.
///
/// The query string is percent-decoded once by the `Query` extractor.
async fn handle_search_topics(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<TopicsResponse>, AppError> {
    let query = params
        .query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Please provide a valid search query".to_string()))?;

    let topics = state.repo.search_topics(&query).await?;
    Ok(Json(TopicsResponse { topics }))
}

// ============ GET /api/topics/{topicId}/texts ============

#[derive(Serialize)]
struct TextsResponse {
    texts: Vec<ProcessedText>,
}

async fn handle_texts_by_topic(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> Result<Json<TextsResponse>, AppError> {
    let topic_id: i64 = topic_id
        .parse()
        .map_err(|_| AppError::Validation("Invalid topic ID".to_string()))?;

    let texts = state.repo.get_texts_by_topic(topic_id).await?;
    Ok(Json(TextsResponse { texts }))
}
