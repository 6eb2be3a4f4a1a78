//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

use crate::core::ChatError;

// Errors

pub struct ApiError(anyhow::Error);

impl ApiError {
    /// Map the underlying error kind to a response status. Retrieval
    /// failures never reach here (the orchestrator absorbs them), so an
    /// escaped one falls through to 500 like any other internal error.
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<ChatError>() {
            Some(ChatError::ConversationNotFound(_)) => StatusCode::NOT_FOUND,
            Some(ChatError::EmptyDocument) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(ChatError::Generation(_)) => StatusCode::BAD_GATEWAY,
            Some(ChatError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Some(ChatError::Retrieval(_)) | None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{:#}", self.0);
        } else {
            tracing::warn!("{}", self.0);
        }

        (status, axum::Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}
