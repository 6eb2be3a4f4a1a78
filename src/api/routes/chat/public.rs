//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::chat::db::TurnRole;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub username: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub content: String,
    pub chat_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPdfQuery {
    pub chat_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPdfResponse {
    pub document_id: String,
}

#[derive(Serialize)]
pub struct TranscriptEntry {
    pub role: TurnRole,
    pub content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub chat_id: String,
    pub username: Option<String>,
    pub transcript: Vec<TranscriptEntry>,
}

#[derive(Deserialize)]
pub struct SessionsQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub username: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub page: usize,
    pub limit: usize,
    pub total_sessions: i64,
    pub total_pages: i64,
}
