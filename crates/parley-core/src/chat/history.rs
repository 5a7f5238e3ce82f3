//! Conversion from client chat messages to provider messages.

use tracing::debug;

use parley_types::chat::{ChatMessage, MessagePart, MessageRole};
use parley_types::llm::{LlmMessage, ToolCall};

/// Flatten client messages into the provider's message list.
///
/// Tool-call parts become `tool_calls` on the assistant message; every
/// tool-result part becomes its own tool-role message right after it.
pub fn to_llm_messages(messages: &[ChatMessage]) -> Vec<LlmMessage> {
    let mut out = Vec::with_capacity(messages.len());

    for message in messages {
        let text = message.text();
        let mut results = Vec::new();
        let mut calls = Vec::new();

        for part in &message.parts {
            match part {
                MessagePart::ToolCall {
                    tool_call_id,
                    tool_name,
                    args,
                } => calls.push(ToolCall {
                    id: tool_call_id.clone(),
                    name: tool_name.clone(),
                    arguments: args.clone(),
                }),
                MessagePart::ToolResult {
                    tool_call_id,
                    result,
                    ..
                } => results.push(LlmMessage::tool_result(
                    tool_call_id.clone(),
                    result.to_string(),
                )),
                MessagePart::Text { .. } => {}
            }
        }

        match message.role {
            MessageRole::Tool => {
                if results.is_empty() {
                    debug!("skipping tool message without a tool result part");
                }
            }
            role => {
                if !text.is_empty() || !calls.is_empty() || !message.attachments.is_empty() {
                    let mut llm = LlmMessage::text(role, text);
                    llm.tool_calls = calls;
                    llm.attachments = message.attachments.clone();
                    out.push(llm);
                }
            }
        }
        out.extend(results);
    }

    out
}
