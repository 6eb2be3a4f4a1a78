//! Database connection and schema setup.
//!
//! One SQLite database holds the conversation/message tables and the
//! sqlite-vec virtual table for chunk embeddings. All async access goes
//! through `tokio_rusqlite::Connection` and `db.call(move |conn| ...)`.

use anyhow::Result;
use tokio_rusqlite::Connection;

use crate::rag::embed::EMBEDDING_DIM;

/// Open an async connection with the sqlite-vec extension loaded.
pub async fn async_db(path: &str) -> Result<Connection> {
    // Register sqlite-vec as an auto-extension for this process so the
    // vec0 module is available on every connection opened afterwards.
    unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    }

    let db = Connection::open(path.to_string()).await?;
    db.call(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    })
    .await?;
    Ok(db)
}

/// Create the schema if it doesn't already exist. Safe to call repeatedly.
pub fn initialize_db(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS conversation (
            id TEXT PRIMARY KEY,
            username TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS message (
            id TEXT PRIMARY KEY,
            chat_id TEXT NOT NULL REFERENCES conversation(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_message_chat ON message (chat_id, created_at);

        CREATE TABLE IF NOT EXISTS chunk (
            id TEXT NOT NULL UNIQUE,
            scope_id TEXT NOT NULL,
            document_id TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_chunk_scope ON chunk (scope_id);

        CREATE VIRTUAL TABLE IF NOT EXISTS chunk_embedding USING vec0(
            embedding float[{dim}]
        );
        "#,
        dim = EMBEDDING_DIM,
    ))
}
