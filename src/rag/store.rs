//! Vector index over embedded document chunks, backed by sqlite-vec.
//!
//! Chunk text and metadata live in the `chunk` table; embeddings live in the
//! `chunk_embedding` vec0 virtual table, joined by rowid. KNN queries are
//! pre-filtered to a scope via `rowid IN (...)`, so an empty scope returns
//! an empty result set rather than an error.

use anyhow::Result;
use chrono::Utc;
use tokio_rusqlite::Connection;
use zerocopy::IntoBytes;

use crate::rag::embed::EMBEDDING_DIM;

/// One chunk pending insertion.
pub struct NewChunk {
    pub id: String,
    pub content: String,
    pub embedding: [f32; EMBEDDING_DIM],
}

/// One retrieval hit. Lower distance means more similar.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub content: String,
    pub distance: f64,
}

/// Bulk-insert chunks under a scope. Atomic: either every chunk and its
/// embedding lands or none do. Retries with regenerated chunk ids will
/// produce duplicate rows; dedup is the caller's concern.
pub async fn insert_chunks(
    db: &Connection,
    scope_id: &str,
    document_id: &str,
    chunks: Vec<NewChunk>,
) -> Result<()> {
    let scope = scope_id.to_owned();
    let document = document_id.to_owned();
    db.call(move |conn| {
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        for chunk in &chunks {
            tx.execute(
                "INSERT INTO chunk (id, scope_id, document_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![chunk.id, scope, document, chunk.content, now],
            )?;
            let rowid = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO chunk_embedding (rowid, embedding) VALUES (?1, ?2)",
                rusqlite::params![rowid, chunk.embedding.as_bytes()],
            )?;
        }
        tx.commit()?;
        Ok(())
    })
    .await?;
    Ok(())
}

/// KNN search scoped to `scope_id`, ordered by ascending distance.
pub async fn search(
    db: &Connection,
    query: [f32; EMBEDDING_DIM],
    scope_id: &str,
    k: usize,
) -> Result<Vec<ScoredChunk>> {
    let scope = scope_id.to_owned();
    let hits = db
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT rowid, distance FROM chunk_embedding
                 WHERE embedding MATCH ?1
                   AND rowid IN (SELECT rowid FROM chunk WHERE scope_id = ?2)
                   AND k = ?3
                 ORDER BY distance",
            )?;
            let matches = stmt
                .query_map(
                    rusqlite::params![query.as_bytes(), scope, k as i64],
                    |row| {
                        let rowid: i64 = row.get(0)?;
                        let distance: f64 = row.get(1)?;
                        Ok((rowid, distance))
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;

            let mut hits = Vec::with_capacity(matches.len());
            for (rowid, distance) in matches {
                let content: String = conn.query_row(
                    "SELECT content FROM chunk WHERE rowid = ?1",
                    rusqlite::params![rowid],
                    |row| row.get(0),
                )?;
                hits.push(ScoredChunk { content, distance });
            }
            Ok(hits)
        })
        .await?;
    Ok(hits)
}
