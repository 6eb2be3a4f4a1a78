//! Conversation core: message store, history assembly, and the
//! orchestration pipeline.

pub mod db;
pub mod history;
pub mod orchestrator;
