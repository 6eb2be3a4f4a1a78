//! Retrieval-augmented generation pipeline: chunking, embedding, and the
//! vector index.

pub mod chunker;
pub mod embed;
pub mod ingest;
pub mod store;
