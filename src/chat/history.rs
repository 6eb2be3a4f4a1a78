//! History assembler: turns the persisted turn sequence plus optional
//! retrieved context into the ordered prompt submitted to the LLM gateway.
//! A pure read-transform; it never mutates turns or allocates identifiers.

use crate::chat::db::{Turn, TurnRole};
use crate::openai::{Message, Role};

/// System instruction used when no retrieved context is available.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
Answer clearly and concisely, in the language of the question. \
If a question is ambiguous, ask for clarification. \
If you do not have enough information to answer, say so instead of guessing.";

/// Preamble prepended to retrieved context in the system entry.
pub const CONTEXT_PREAMBLE: &str = "Use the following context to answer when it is relevant. \
If the context does not cover the question, say that you do not have enough information.\n\n\
Context:\n";

/// Build the prompt history: exactly one leading system entry, then every
/// stored turn in stored order with content copied verbatim.
///
/// Relevance filtering is the retrieval index's concern; any non-empty
/// context handed in here is included as-is.
pub fn build_history(turns: &[Turn], retrieved_context: Option<&str>) -> Vec<Message> {
    let system_content = match retrieved_context {
        Some(context) if !context.trim().is_empty() => {
            format!("{CONTEXT_PREAMBLE}{context}")
        }
        _ => DEFAULT_SYSTEM_PROMPT.to_string(),
    };

    let mut history = Vec::with_capacity(turns.len() + 1);
    history.push(Message::new(Role::System, &system_content));
    for turn in turns {
        let role = match turn.role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        };
        history.push(Message::new(role, &turn.content));
    }
    history
}
