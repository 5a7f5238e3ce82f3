//! Message logger: persists the inbound user message and the assistant
//! output of a turn. Failures are logged and never end the turn.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use parley_types::chat::{ChatMessage, StoredMessage};

use super::repository::MessageRepository;

pub struct MessageLogger<M: MessageRepository> {
    repo: Arc<M>,
}

impl<M: MessageRepository> MessageLogger<M> {
    pub fn new(repo: Arc<M>) -> Self {
        Self { repo }
    }

    /// Persist the user's message, attachments included.
    pub async fn log_user_message(
        &self,
        chat_id: &str,
        user_id: &str,
        message: &ChatMessage,
        model: &str,
    ) {
        let row = to_stored(chat_id, user_id, message, model);
        match self.repo.save_messages(std::slice::from_ref(&row)).await {
            Ok(()) => debug!(chat_id, message_id = %row.id, "user message logged"),
            Err(e) => error!(
                target: "persistence",
                chat_id,
                error = %e,
                "failed to log user message"
            ),
        }
    }

    /// Persist the assistant and tool messages produced by a finished stream.
    pub async fn store_assistant_messages(
        &self,
        chat_id: &str,
        user_id: &str,
        model: &str,
        messages: &[ChatMessage],
    ) {
        if messages.is_empty() {
            return;
        }
        let rows: Vec<StoredMessage> = messages
            .iter()
            .map(|m| to_stored(chat_id, user_id, m, model))
            .collect();

        match self.repo.save_messages(&rows).await {
            Ok(()) => debug!(chat_id, count = rows.len(), "assistant messages stored"),
            Err(e) => error!(
                target: "persistence",
                chat_id,
                error = %e,
                "failed to store assistant messages"
            ),
        }
    }
}

fn to_stored(chat_id: &str, user_id: &str, message: &ChatMessage, model: &str) -> StoredMessage {
    StoredMessage {
        id: Uuid::now_v7(),
        chat_id: chat_id.to_string(),
        user_id: Some(user_id.to_string()),
        role: message.role,
        content: message.text(),
        parts: message.parts.clone(),
        attachments: message.attachments.clone(),
        model: Some(model.to_string()).filter(|m| !m.is_empty()),
        created_at: Utc::now(),
    }
}
