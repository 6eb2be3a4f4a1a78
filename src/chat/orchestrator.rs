//! Conversation orchestrator: the pipeline that turns an inbound user
//! message into a persisted exchange.
//!
//! Ordering guarantees: the user turn commits before any retrieval or
//! generation work begins, and the assistant turn is the last write of the
//! turn. A generation failure leaves the user turn in place, so retrying
//! the call resumes from retrieval without resubmitting the message. The
//! orchestrator does not serialize concurrent calls against one
//! conversation; callers needing strict interleaving must serialize
//! upstream.

use std::sync::Arc;

use anyhow::Result;
use tokio_rusqlite::Connection;

use crate::chat::db::{TurnRole, append_turn, list_turns, resolve_or_create_conversation};
use crate::chat::history::build_history;
use crate::core::{AppConfig, ChatError};
use crate::openai::LlmGateway;
use crate::rag::embed::Embedder;
use crate::rag::store;

/// Scope queried when a conversation has no private index of its own, and
/// the default scope for uploads that name no conversation.
pub const SHARED_SCOPE: &str = "shared";

#[derive(Debug)]
pub struct IncomingMessage {
    pub chat_id: Option<String>,
    pub username: Option<String>,
    pub message: String,
}

#[derive(Debug)]
pub struct ChatReply {
    pub content: String,
    pub chat_id: String,
}

/// Handle one user turn end to end: resolve the conversation, persist the
/// user turn, retrieve context (best effort), assemble history, generate,
/// persist the assistant turn, and return the reply.
pub async fn handle_user_message(
    db: &Connection,
    gateway: &LlmGateway,
    embedder: Arc<Embedder>,
    config: &AppConfig,
    incoming: IncomingMessage,
) -> Result<ChatReply> {
    let chat_id =
        resolve_or_create_conversation(db, incoming.chat_id, incoming.username).await?;

    // Durably record the user's message before any generation work; later
    // failures must not lose it.
    append_turn(db, &chat_id, TurnRole::User, &incoming.message).await?;

    // Only retrieval failures degrade to no-context generation. Persistence
    // failures below propagate as errors.
    let context = match retrieve_context(
        db,
        embedder,
        &incoming.message,
        &chat_id,
        config.retrieval_k,
    )
    .await
    {
        Ok(context) => context,
        Err(err) => {
            tracing::warn!(chat_id = %chat_id, %err, "retrieval failed, continuing without context");
            None
        }
    };

    let turns = list_turns(db, &chat_id).await?;
    let history = build_history(&turns, context.as_deref());

    let content = gateway.generate(&history).await?;

    append_turn(db, &chat_id, TurnRole::Assistant, &content).await?;

    Ok(ChatReply { content, chat_id })
}

/// Query the vector index for text similar to the message, scoped to the
/// conversation, falling back to the shared scope when the conversation
/// has no indexed chunks. Returns `None` when nothing is indexed.
async fn retrieve_context(
    db: &Connection,
    embedder: Arc<Embedder>,
    query: &str,
    chat_id: &str,
    k: usize,
) -> Result<Option<String>, ChatError> {
    let text = query.to_string();
    let query_embedding = tokio::task::spawn_blocking(move || embedder.embed_one(&text))
        .await
        .map_err(|e| ChatError::Retrieval(e.to_string()))?
        .map_err(|e| ChatError::Retrieval(e.to_string()))?;

    let mut hits = store::search(db, query_embedding, chat_id, k)
        .await
        .map_err(|e| ChatError::Retrieval(e.to_string()))?;
    if hits.is_empty() {
        hits = store::search(db, query_embedding, SHARED_SCOPE, k)
            .await
            .map_err(|e| ChatError::Retrieval(e.to_string()))?;
    }
    if hits.is_empty() {
        return Ok(None);
    }

    let context = hits
        .iter()
        .map(|hit| hit.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(Some(context))
}
