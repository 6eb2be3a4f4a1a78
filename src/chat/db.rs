//! Message store: durable, ordered record of chat turns per conversation.

use anyhow::Result;
use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use crate::core::ChatError;

/// Role of a persisted turn. A closed set: history assembly maps these to
/// prompt roles explicitly, there is no name-based lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl TryFrom<&str> for TurnRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("unknown turn role '{other}'")),
        }
    }
}

/// One persisted message. Immutable once written.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub id: String,
    pub chat_id: String,
    pub role: TurnRole,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: String,
    pub username: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Create a conversation with a fresh id.
pub async fn create_conversation(
    db: &Connection,
    username: Option<String>,
) -> Result<Conversation> {
    let conversation = Conversation {
        id: Uuid::new_v4().to_string(),
        username,
        created_at: Utc::now().to_rfc3339(),
        updated_at: Utc::now().to_rfc3339(),
    };
    let row = conversation.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO conversation (id, username, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![row.id, row.username, row.created_at, row.updated_at],
        )?;
        Ok(())
    })
    .await?;
    Ok(conversation)
}

/// Return the supplied conversation id, or create a new conversation when
/// none was supplied. A supplied id is trusted as-is; a stale id surfaces
/// as a foreign key failure on the first turn write, not as a pre-check
/// here. Creates at most one conversation per call.
pub async fn resolve_or_create_conversation(
    db: &Connection,
    chat_id: Option<String>,
    username: Option<String>,
) -> Result<String> {
    match chat_id {
        Some(id) => Ok(id),
        None => Ok(create_conversation(db, username).await?.id),
    }
}

pub async fn find_conversation(db: &Connection, chat_id: &str) -> Result<Option<Conversation>> {
    let id = chat_id.to_owned();
    let found = db
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, created_at, updated_at FROM conversation WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map([id], |row| {
                Ok(Conversation {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?;
            Ok(rows.next().transpose()?)
        })
        .await?;
    Ok(found)
}

/// Append a turn to a conversation. The insert and the conversation's
/// `updated_at` bump commit together.
pub async fn append_turn(
    db: &Connection,
    chat_id: &str,
    role: TurnRole,
    content: &str,
) -> Result<Turn> {
    let turn = Turn {
        id: Uuid::new_v4().to_string(),
        chat_id: chat_id.to_owned(),
        role,
        content: content.to_owned(),
        created_at: Utc::now().to_rfc3339(),
    };
    let row = turn.clone();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO message (id, chat_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                row.id,
                row.chat_id,
                row.role.as_str(),
                row.content,
                row.created_at
            ],
        )?;
        tx.execute(
            "UPDATE conversation SET updated_at = ?1 WHERE id = ?2",
            rusqlite::params![row.created_at, row.chat_id],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await?;
    Ok(turn)
}

/// List a conversation's turns in creation order. Fails with
/// [`ChatError::ConversationNotFound`] when the id is unknown; this check
/// belongs to the message store, not its callers.
pub async fn list_turns(db: &Connection, chat_id: &str) -> Result<Vec<Turn>> {
    let id = chat_id.to_owned();
    let turns = db
        .call(move |conn| {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM conversation WHERE id = ?1",
                    [id.clone()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT id, chat_id, role, content, created_at
                 FROM message
                 WHERE chat_id = ?1
                 ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([id], |row| {
                    let role_str: String = row.get(2)?;
                    let role = TurnRole::try_from(role_str.as_str()).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Text,
                            e.into(),
                        )
                    })?;
                    Ok(Turn {
                        id: row.get(0)?,
                        chat_id: row.get(1)?,
                        role,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(rows))
        })
        .await?;

    turns.ok_or_else(|| ChatError::ConversationNotFound(chat_id.to_owned()).into())
}
