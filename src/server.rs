//! HTTP surface.
//!
//! One demo endpoint plus operational extras:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/rag-response` | Ingest the documents directory, then answer the prompt |
//! | `POST` | `/ingest` | Run ingestion on its own and return the report |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error contract
//!
//! Every error body carries a machine-readable `code` and a stringified
//! `message`:
//!
//! ```json
//! { "response": "data input format error", "code": "bad_request", "message": "..." }
//! ```
//!
//! A malformed request body (invalid JSON, missing `prompt`) is rejected
//! with `400` before any ingestion work begins. Collaborator failures
//! (extraction, store, embedding, completion) surface as `500` with code
//! `internal`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::embedding;
use crate::ingest;
use crate::llm;
use crate::migrate;
use crate::store;

/// Answer returned when no chat-completion provider is configured.
const LLM_DISABLED_RESPONSE: &str = "language model is not configured";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pool: sqlx::SqlitePool,
}

impl AppState {
    /// Open the store (running migrations) and wrap the configuration.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(config).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self {
            config: Arc::new(config.clone()),
            pool,
        })
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/rag-response", post(handle_rag_response))
        .route("/ingest", post(handle_ingest))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address and serve until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::new(config).await?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "ragserve listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// Error that converts into the structured JSON error body.
struct AppError {
    status: StatusCode,
    response: &'static str,
    code: &'static str,
    message: String,
}

impl AppError {
    /// 400 for malformed request input.
    fn input_format(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: "data input format error",
            code: "bad_request",
            message: message.into(),
        }
    }

    /// 500 for collaborator failures.
    fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            response: "internal error",
            code: "internal",
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "response": self.response,
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

// ============ POST /rag-response ============

#[derive(Deserialize)]
struct RagRequest {
    prompt: String,
}

#[derive(Serialize)]
struct RagResponse {
    response: String,
    #[serde(rename = "db-message")]
    db_message: String,
}

/// Handler for `POST /rag-response`.
///
/// Re-ingests the documents directory (incremental by chunk identifier),
/// then answers the prompt over the most similar stored chunks.
async fn handle_rag_response(
    State(state): State<AppState>,
    payload: Result<Json<RagRequest>, JsonRejection>,
) -> Result<Json<RagResponse>, AppError> {
    // Reject malformed input before any ingestion work.
    let Json(request) = payload.map_err(|rejection| AppError::input_format(rejection.body_text()))?;

    let report = ingest::run_ingest(&state.config, &state.pool, None)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(
        chunks = report.chunks,
        new_chunks = report.new_chunks,
        "ingest completed for rag-response"
    );

    let response = answer_prompt(&state, &request.prompt)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(RagResponse {
        response,
        db_message: report.db_message(),
    }))
}

/// Retrieve context and run the completion. With the LLM disabled the
/// endpoint still answers, with a fixed placeholder.
async fn answer_prompt(state: &AppState, prompt: &str) -> anyhow::Result<String> {
    if !state.config.llm.is_enabled() {
        return Ok(LLM_DISABLED_RESPONSE.to_string());
    }

    let context = if state.config.embedding.is_enabled() {
        let query_vec = embedding::embed_query(&state.config.embedding, prompt).await?;
        store::similar_chunks(&state.pool, &query_vec, state.config.retrieval.top_k).await?
    } else {
        Vec::new()
    };

    let user_prompt = llm::build_prompt(&context, prompt);
    llm::complete(&state.config.llm, &user_prompt).await
}

// ============ POST /ingest ============

#[derive(Serialize)]
struct IngestResponse {
    #[serde(rename = "db-message")]
    db_message: String,
    documents: usize,
    chunks: usize,
    new_chunks: usize,
}

/// Handler for `POST /ingest` — ingestion decoupled from answering.
async fn handle_ingest(State(state): State<AppState>) -> Result<Json<IngestResponse>, AppError> {
    let report = ingest::run_ingest(&state.config, &state.pool, None)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(IngestResponse {
        db_message: report.db_message(),
        documents: report.documents,
        chunks: report.chunks,
        new_chunks: report.new_chunks,
    }))
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
