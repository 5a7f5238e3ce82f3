//! Chat turn and message types.
//!
//! The wire shapes follow the client's chat payload (camelCase fields,
//! tagged message parts). `ChatTurnRequest` is the raw body; `validate`
//! turns it into a `ChatTurn` whose invariants hold for the rest of the flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ChatError;
use crate::llm::{StopReason, Usage};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "tool" => Ok(MessageRole::Tool),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A file attached to a user message, referenced by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub url: String,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// Structured content carried alongside a message's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum MessagePart {
    Text {
        text: String,
    },
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        #[serde(default)]
        args: serde_json::Value,
    },
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        #[serde(default)]
        result: serde_json::Value,
    },
}

impl MessagePart {
    pub fn is_tool_part(&self) -> bool {
        matches!(self, MessagePart::ToolCall { .. } | MessagePart::ToolResult { .. })
    }
}

/// One message of a conversation as exchanged with the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(
        default,
        alias = "experimental_attachments",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
            parts: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// The message text: `content` when set, otherwise the joined text parts.
    pub fn text(&self) -> String {
        if !self.content.is_empty() {
            return self.content.clone();
        }
        self.parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// True when the message carries nothing a model could read.
    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty() && self.attachments.is_empty() && self.parts.is_empty()
    }
}

/// Raw chat request body. Every field is optional here so that missing
/// fields surface as a validation error instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// A validated chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub messages: Vec<ChatMessage>,
    pub chat_id: String,
    pub user_id: String,
    pub model: String,
    pub is_authenticated: bool,
    pub system_prompt: Option<String>,
    pub agent_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ChatTurnRequest {
    /// Check the required fields and normalize blank optionals to `None`.
    pub fn validate(self) -> Result<ChatTurn, ChatError> {
        let messages = self.messages.filter(|m| !m.is_empty());
        let chat_id = non_blank(self.chat_id);
        let user_id = non_blank(self.user_id);

        let (Some(messages), Some(chat_id), Some(user_id)) = (messages, chat_id, user_id) else {
            return Err(ChatError::Validation(
                "Error, missing information".to_string(),
            ));
        };

        Ok(ChatTurn {
            messages,
            chat_id,
            user_id,
            model: non_blank(self.model).unwrap_or_default(),
            is_authenticated: self.is_authenticated,
            system_prompt: non_blank(self.system_prompt),
            agent_id: non_blank(self.agent_id),
        })
    }
}

impl ChatTurn {
    /// The most recent user-role message, if any.
    pub fn latest_user_message(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
    }

    /// The last message, when it was sent by the user.
    pub fn trailing_user_message(&self) -> Option<&ChatMessage> {
        self.messages
            .last()
            .filter(|m| m.role == MessageRole::User)
    }
}

/// A persisted chat message row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub chat_id: String,
    pub user_id: Option<String>,
    pub role: MessageRole,
    pub content: String,
    pub parts: Vec<MessagePart>,
    pub attachments: Vec<Attachment>,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything a fully drained model stream produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamOutcome {
    /// Concatenated assistant text across all steps.
    pub text: String,
    /// Assistant and tool messages in the order they were produced.
    pub messages: Vec<ChatMessage>,
    pub finish_reason: StopReason,
    pub usage: Usage,
    pub steps: u32,
}

impl Default for StreamOutcome {
    fn default() -> Self {
        Self {
            text: String::new(),
            messages: Vec::new(),
            finish_reason: StopReason::EndTurn,
            usage: Usage::default(),
            steps: 0,
        }
    }
}
