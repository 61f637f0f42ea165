//! JSON HTTP API for the simplification service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload-document` | Multipart upload; extract, simplify, persist |
//! | `POST` | `/simplify` | Simplify raw text directly |
//! | `POST` | `/chat` | Ask a question about a stored document |
//! | `GET`  | `/document/{id}` | Fetch a processed document |
//! | `GET`  | `/documents` | List all documents, newest first |
//! | `DELETE` | `/document/{id}` | Hard-delete a document |
//! | `GET`  | `/languages` | Supported language set |
//! | `GET`  | `/stats` | Aggregate processing statistics |
//! | `GET`  | `/health` | Health check |
//! | `GET`  | `/` | Service banner |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "No file provided" } }
//! ```
//!
//! Codes: `bad_request` (400), `not_found` (404), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser clients.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::ai::AiClient;
use crate::config::Config;
use crate::extract;
use crate::ingest;
use crate::models::ChatTurn;
use crate::qa::QuestionAnswerer;
use crate::simplify::Simplifier;
use crate::store;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
    simplifier: Arc<Simplifier>,
    qa: Arc<QuestionAnswerer>,
}

/// Builds the application router over an already-connected pool. The API key
/// must be resolved by the caller; handlers never read the environment.
pub fn build_router(
    config: Arc<Config>,
    pool: SqlitePool,
    api_key: Option<String>,
) -> anyhow::Result<Router> {
    let ai = Arc::new(AiClient::new(&config.ai, api_key)?);

    // Multipart framing adds overhead on top of the enforced file size limit
    let body_limit = config.upload.max_upload_bytes + 1024 * 1024;

    let state = AppState {
        config,
        pool,
        simplifier: Arc::new(Simplifier::new(ai.clone())),
        qa: Arc::new(QuestionAnswerer::new(ai)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/languages", get(handle_languages))
        .route("/stats", get(handle_stats))
        .route("/upload-document", post(handle_upload))
        .route("/simplify", post(handle_simplify))
        .route("/chat", post(handle_chat))
        .route("/document/{id}", get(handle_get_document))
        .route("/document/{id}", delete(handle_delete_document))
        .route("/documents", get(handle_list_documents))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state);

    Ok(app)
}

/// Starts the HTTP server. Binds to `[server].bind` and runs until the
/// process is terminated. The AI API key is resolved here, once, from the
/// env var named in config.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = crate::db::connect(config).await?;
    crate::migrate::apply_schema(&pool).await?;

    let api_key = std::env::var(&config.ai.api_key_env).ok();
    if api_key.is_none() {
        tracing::warn!(
            "{} not set; simplification will use the rule-based fallback",
            config.ai.api_key_env
        );
    }

    let app = build_router(Arc::new(config.clone()), pool, api_key)?;

    tracing::info!("listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    tracing::error!("internal error: {:#}", err);
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: err.to_string(),
    }
}

// ============ GET / ============

async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "PlainDoc legal document simplification API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active",
        "endpoints": {
            "upload": "/upload-document",
            "simplify": "/simplify",
            "chat": "/chat",
            "health": "/health",
            "documents": "/documents",
            "stats": "/stats"
        }
    }))
}

// ============ GET /health ============

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": "PlainDoc"
    }))
}

// ============ GET /languages ============

async fn handle_languages() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "languages": [
            {"code": "en", "name": "English", "native_name": "English"},
            {"code": "hi", "name": "Hindi", "native_name": "हिंदी"},
            {"code": "mr", "name": "Marathi", "native_name": "मराठी"}
        ]
    }))
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let summary = store::stats(&state.pool).await.map_err(internal)?;
    Ok(Json(serde_json::to_value(summary).map_err(|e| internal(e.into()))?))
}

// ============ POST /upload-document ============

#[derive(Deserialize)]
struct UploadParams {
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_complexity")]
    complexity: String,
    /// When true, simplify-and-persist runs detached; poll /document/{id}.
    #[serde(default)]
    defer: bool,
}

fn default_language() -> String {
    "en".to_string()
}
fn default_complexity() -> String {
    "simple".to_string()
}

#[derive(Serialize)]
struct UploadResponse {
    id: String,
    filename: String,
    simplified_text: String,
    status: String,
}

async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    // First multipart field carrying a filename is the upload
    let mut filename = None;
    let mut bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if let Some(name) = field.file_name() {
            filename = Some(name.to_string());
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(e.to_string()))?,
            );
            break;
        }
    }

    let (filename, bytes) = match (filename, bytes) {
        (Some(f), Some(b)) => (f, b),
        _ => return Err(bad_request("No file provided")),
    };

    let ext = ingest::validate_upload(&filename, bytes.len(), state.config.upload.max_upload_bytes)
        .map_err(|e| bad_request(e.to_string()))?;

    let original_text = extract::extract_text(&bytes, &ext)
        .await
        .map_err(|e| bad_request(e.to_string()))?;

    let doc_id = Uuid::new_v4().to_string();

    if params.defer {
        // Fire-and-forget: the terminal record is the only failure channel
        ingest::spawn_processing(
            state.pool.clone(),
            state.simplifier.clone(),
            doc_id.clone(),
            filename.clone(),
            original_text,
            params.language,
            params.complexity,
        );
        return Ok(Json(UploadResponse {
            id: doc_id,
            filename,
            simplified_text: String::new(),
            status: "processing".to_string(),
        }));
    }

    let record = ingest::process_document(
        &state.pool,
        &state.simplifier,
        &doc_id,
        &filename,
        &original_text,
        &params.language,
        &params.complexity,
    )
    .await
    .map_err(internal)?;

    Ok(Json(UploadResponse {
        id: record.id,
        filename: record.filename,
        simplified_text: record.simplified_text,
        status: record.status.as_str().to_string(),
    }))
}

// ============ POST /simplify ============

#[derive(Deserialize)]
struct SimplifyRequest {
    text: String,
    #[serde(default = "default_language")]
    target_language: String,
    #[serde(default = "default_complexity")]
    complexity_level: String,
}

#[derive(Serialize)]
struct SimplifyResponse {
    original_text: String,
    simplified_text: String,
    language: String,
    complexity_level: String,
    word_count_original: i64,
    word_count_simplified: i64,
}

/// Truncates the echoed original to 500 characters with an ellipsis.
fn truncate_echo(text: &str) -> String {
    match text.char_indices().nth(500) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

async fn handle_simplify(
    State(state): State<AppState>,
    Json(req): Json<SimplifyRequest>,
) -> Result<Json<SimplifyResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }

    let simplified = state
        .simplifier
        .simplify(&req.text, &req.target_language, &req.complexity_level)
        .await;

    Ok(Json(SimplifyResponse {
        original_text: truncate_echo(&req.text),
        word_count_original: ingest::word_count(&req.text),
        word_count_simplified: ingest::word_count(&simplified),
        simplified_text: simplified,
        language: req.target_language,
        complexity_level: req.complexity_level,
    }))
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    document_id: Option<String>,
    #[serde(default = "default_language")]
    language: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    confidence: f64,
    relevant_clauses: Vec<String>,
    session_id: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }

    // Resolve document context before any transcript is written: an unknown
    // document id must 404 without side effects.
    let document_text = match &req.document_id {
        Some(doc_id) => {
            let record = store::get_document(&state.pool, doc_id)
                .await
                .map_err(internal)?
                .ok_or_else(|| not_found("Document not found"))?;
            record.original_text
        }
        None => "General legal knowledge base".to_string(),
    };

    let answer = state
        .qa
        .answer(&req.message, &document_text, &req.language)
        .await;

    let session_id = store::generate_session_id(&req.message, Utc::now());
    let turn = ChatTurn {
        user_message: req.message.clone(),
        ai_response: answer.response.clone(),
        timestamp: Utc::now().to_rfc3339(),
    };
    store::append_chat_turn(&state.pool, &session_id, req.document_id.as_deref(), turn)
        .await
        .map_err(internal)?;

    Ok(Json(ChatResponse {
        response: answer.response,
        confidence: answer.confidence,
        relevant_clauses: answer.relevant_clauses,
        session_id,
    }))
}

// ============ GET /document/{id} ============

async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = store::get_document(&state.pool, &id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Document not found"))?;
    Ok(Json(serde_json::to_value(record).map_err(|e| internal(e.into()))?))
}

// ============ GET /documents ============

async fn handle_list_documents(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (documents, total_count) = store::list_documents(&state.pool).await.map_err(internal)?;
    Ok(Json(serde_json::json!({
        "documents": documents,
        "total_count": total_count,
    })))
}

// ============ DELETE /document/{id} ============

async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    // Existence check first so absent ids report 404 even though the
    // storage-layer delete is idempotent
    store::get_document(&state.pool, &id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Document not found"))?;

    store::delete_document(&state.pool, &id)
        .await
        .map_err(internal)?;

    Ok(Json(serde_json::json!({
        "message": format!("Document {} deleted successfully", id)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_truncation_appends_ellipsis_past_500_chars() {
        let long = "x".repeat(600);
        let echoed = truncate_echo(&long);
        assert_eq!(echoed.len(), 503);
        assert!(echoed.ends_with("..."));
    }

    #[test]
    fn echo_truncation_leaves_short_text_untouched() {
        assert_eq!(truncate_echo("short"), "short");
    }
}
