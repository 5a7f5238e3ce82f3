//! SQLite message repository implementation.
//!
//! Implements `MessageRepository` from `parley-core`. Parts and attachments
//! are stored as JSON text columns.

use chrono::{DateTime, Utc};
use parley_core::chat::repository::MessageRepository;
use parley_types::chat::{Attachment, MessagePart, MessageRole, StoredMessage};
use parley_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct MessageRow {
    id: String,
    chat_id: String,
    user_id: Option<String>,
    role: String,
    content: String,
    parts: String,
    attachments: String,
    model: Option<String>,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            user_id: row.try_get("user_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            parts: row.try_get("parts")?,
            attachments: row.try_get("attachments")?,
            model: row.try_get("model")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<StoredMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let parts: Vec<MessagePart> = serde_json::from_str(&self.parts)
            .map_err(|e| RepositoryError::Query(format!("invalid parts JSON: {e}")))?;
        let attachments: Vec<Attachment> = serde_json::from_str(&self.attachments)
            .map_err(|e| RepositoryError::Query(format!("invalid attachments JSON: {e}")))?;

        Ok(StoredMessage {
            id,
            chat_id: self.chat_id,
            user_id: self.user_id,
            role,
            content: self.content,
            parts,
            attachments,
            model: self.model,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

impl MessageRepository for SqliteMessageRepository {
    async fn save_messages(&self, messages: &[StoredMessage]) -> Result<(), RepositoryError> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for message in messages {
            let parts = serde_json::to_string(&message.parts)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let attachments = serde_json::to_string(&message.attachments)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

            sqlx::query(
                r#"INSERT INTO messages (id, chat_id, user_id, role, content, parts, attachments, model, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(message.id.to_string())
            .bind(&message.chat_id)
            .bind(&message.user_id)
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(&parts)
            .bind(&attachments)
            .bind(&message.model)
            .bind(message.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<StoredMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE chat_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row =
                MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(message_row.into_message()?);
        }
        Ok(messages)
    }
}
