//! Document ingestion: raw bytes in, indexed chunks out.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use crate::core::ChatError;
use crate::rag::chunker::split_text;
use crate::rag::embed::Embedder;
use crate::rag::store::{self, NewChunk};

/// Result of a successful ingestion.
#[derive(Debug)]
pub struct IngestReceipt {
    pub document_id: String,
    pub chunk_ids: Vec<String>,
}

/// Extract text from a PDF and index it under `scope_id`.
pub async fn ingest_pdf(
    db: &Connection,
    embedder: Arc<Embedder>,
    bytes: &[u8],
    scope_id: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<IngestReceipt> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).context("failed to extract text from PDF")?;
    ingest_text(db, embedder, &text, scope_id, chunk_size, chunk_overlap).await
}

/// Split `text` into overlapping chunks, embed them, and insert the batch
/// into the vector index. Fails with [`ChatError::EmptyDocument`] when the
/// text yields zero chunks.
///
/// Each chunk gets a fresh id, so retrying a failed ingestion inserts
/// duplicate chunks rather than replacing the earlier ones.
pub async fn ingest_text(
    db: &Connection,
    embedder: Arc<Embedder>,
    text: &str,
    scope_id: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<IngestReceipt> {
    let contents = split_text(text, chunk_size, chunk_overlap);
    if contents.is_empty() {
        return Err(ChatError::EmptyDocument.into());
    }

    tracing::info!(scope_id, count = contents.len(), "indexing document chunks");

    // Embedding is CPU-bound, keep it off the async runtime. A failed
    // batch fails the whole ingestion; nothing is inserted.
    let embeddings = {
        let contents = contents.clone();
        tokio::task::spawn_blocking(move || embedder.embed(&contents)).await??
    };

    let document_id = Uuid::new_v4().to_string();
    let chunks: Vec<NewChunk> = contents
        .into_iter()
        .zip(embeddings)
        .map(|(content, embedding)| NewChunk {
            id: Uuid::new_v4().to_string(),
            content,
            embedding,
        })
        .collect();
    let chunk_ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();

    store::insert_chunks(db, scope_id, &document_id, chunks).await?;

    Ok(IngestReceipt {
        document_id,
        chunk_ids,
    })
}
