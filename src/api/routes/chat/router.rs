//! Router for the chat API

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use http::{HeaderMap, header};
use serde_json::json;

use super::db::{conversation_count, conversation_list};
use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::chat::db::{find_conversation, list_turns};
use crate::chat::orchestrator::{IncomingMessage, SHARED_SCOPE, handle_user_message};
use crate::rag::ingest::ingest_pdf;

type SharedState = Arc<RwLock<AppState>>;

/// Initiate or continue a conversation and return the assistant's reply
async fn chat_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Reject before the orchestrator runs so nothing is persisted.
    if payload.message.trim().is_empty() {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": "message must not be empty" })),
        )
            .into_response());
    }

    let (db, gateway, embedder, config) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.db.clone(),
            shared_state.gateway.clone(),
            shared_state.embedder.clone(),
            shared_state.config.clone(),
        )
    };

    let reply = handle_user_message(
        &db,
        &gateway,
        embedder,
        &config,
        IncomingMessage {
            chat_id: payload.chat_id,
            username: payload.username,
            message: payload.message,
        },
    )
    .await?;

    Ok(axum::Json(public::ChatResponse {
        content: reply.content,
        chat_id: reply.chat_id,
    })
    .into_response())
}

/// Index a PDF document for retrieval. The scope is the `chatId` query
/// parameter when present, otherwise the shared scope.
async fn upload_pdf(
    State(state): State<SharedState>,
    Query(params): Query<public::UploadPdfQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let is_pdf = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Ok((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            axum::Json(json!({ "error": "expected an application/pdf body" })),
        )
            .into_response());
    }

    let (db, embedder, config) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.db.clone(),
            shared_state.embedder.clone(),
            shared_state.config.clone(),
        )
    };

    let scope = params.chat_id.as_deref().unwrap_or(SHARED_SCOPE);
    let receipt = ingest_pdf(
        &db,
        embedder,
        &body,
        scope,
        config.chunk_size,
        config.chunk_overlap,
    )
    .await?;

    Ok(axum::Json(public::UploadPdfResponse {
        document_id: receipt.document_id,
    })
    .into_response())
}

/// Get a conversation transcript by ID
async fn transcript(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<axum::Json<public::TranscriptResponse>, ApiError> {
    let db = state
        .read()
        .expect("Unable to read shared state")
        .db
        .clone();

    // Unknown ids fail here with ConversationNotFound, mapped to 404.
    let turns = list_turns(&db, &id).await?;
    let conversation = find_conversation(&db, &id).await?;

    Ok(axum::Json(public::TranscriptResponse {
        chat_id: id,
        username: conversation.and_then(|c| c.username),
        transcript: turns
            .into_iter()
            .map(|turn| public::TranscriptEntry {
                role: turn.role,
                content: turn.content,
            })
            .collect(),
    }))
}

/// Get a paginated list of all conversations
async fn chat_list(
    State(state): State<SharedState>,
    Query(params): Query<public::SessionsQuery>,
) -> Result<axum::Json<public::SessionsResponse>, ApiError> {
    let db = state
        .read()
        .expect("Unable to read shared state")
        .db
        .clone();
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, i64::MAX as usize);
    // Saturate and cap so huge page numbers stay a valid SQL offset.
    let offset = (page - 1).saturating_mul(limit).min(i64::MAX as usize);
    let total_sessions = conversation_count(&db).await?;
    let sessions = conversation_list(&db, limit, offset).await?;
    let total_pages = (total_sessions as f64 / limit as f64).ceil() as i64;

    Ok(axum::Json(public::SessionsResponse {
        sessions,
        page,
        limit,
        total_sessions,
        total_pages,
    }))
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/upload-pdf", post(upload_pdf))
        .route("/sessions", get(chat_list))
        .route("/{id}", get(transcript))
}
