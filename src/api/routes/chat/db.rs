//! Queries backing the conversation listing endpoints.

use anyhow::Result;
use tokio_rusqlite::Connection;

use super::public::SessionSummary;

pub async fn conversation_count(db: &Connection) -> Result<i64> {
    let count = db
        .call(|conn| {
            let count =
                conn.query_row("SELECT COUNT(*) FROM conversation", [], |row| row.get(0))?;
            Ok(count)
        })
        .await?;
    Ok(count)
}

/// Most recently active conversations first.
pub async fn conversation_list(
    db: &Connection,
    limit: usize,
    offset: usize,
) -> Result<Vec<SessionSummary>> {
    let sessions = db
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, created_at, updated_at
                 FROM conversation
                 ORDER BY updated_at DESC
                 LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map([limit, offset], |row| {
                    Ok(SessionSummary {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?;
    Ok(sessions)
}
