//! Error kinds shared across the chat pipeline.
//!
//! The boundary layer maps these to response statuses; everything else
//! propagates through `anyhow` and is reported as an internal error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// A referenced conversation id is unknown to the message store.
    #[error("conversation {0} not found")]
    ConversationNotFound(String),

    /// Ingestion produced zero chunks of extractable text.
    #[error("document contains no extractable text")]
    EmptyDocument,

    /// The LLM provider timed out, returned an error status, or sent a
    /// malformed response. The user turn persisted before generation is
    /// retained so the caller can retry.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Unsupported model or provider. Surfaced at process startup, never
    /// per-request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Vector index lookup failed. Suppressed by the orchestrator, which
    /// degrades to no-context generation; never surfaced to the caller.
    #[error("retrieval failed: {0}")]
    Retrieval(String),
}
