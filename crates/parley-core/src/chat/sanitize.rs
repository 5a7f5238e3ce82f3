//! Conversation cleanup before a model call.

use parley_types::chat::{ChatMessage, MessageRole};

/// Normalize `messages` into valid model input for the current tool setup.
///
/// With tools inactive, tool-role messages and tool-call/tool-result parts
/// are removed. In both modes, messages left with no text, attachments or
/// parts are dropped. Pure and idempotent.
pub fn clean_messages(messages: &[ChatMessage], tools_active: bool) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter(|m| tools_active || m.role != MessageRole::Tool)
        .map(|m| {
            if tools_active {
                return m.clone();
            }
            let mut cleaned = m.clone();
            cleaned.parts.retain(|p| !p.is_tool_part());
            cleaned
        })
        .filter(|m| !m.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::chat::MessagePart;
    use serde_json::json;

    fn has_tool_content(messages: &[ChatMessage]) -> bool {
        messages.iter().any(|m| {
            m.role == MessageRole::Tool || m.parts.iter().any(MessagePart::is_tool_part)
        })
    }

    fn tool_call_message() -> ChatMessage {
        let mut msg = ChatMessage::assistant("");
        msg.parts.push(MessagePart::ToolCall {
            tool_call_id: "t1".into(),
            tool_name: "webSearch".into(),
            args: json!({"query": "rust"}),
        });
        msg
    }

    fn tool_result_message() -> ChatMessage {
        let mut msg = ChatMessage::new(MessageRole::Tool, "");
        msg.parts.push(MessagePart::ToolResult {
            tool_call_id: "t1".into(),
            tool_name: "webSearch".into(),
            result: json!(["a"]),
        });
        msg
    }

    fn history() -> Vec<ChatMessage> {
        let mut mixed = ChatMessage::assistant("Here is what I found");
        mixed.parts.push(MessagePart::ToolCall {
            tool_call_id: "t2".into(),
            tool_name: "webSearch".into(),
            args: json!({}),
        });
        vec![
            ChatMessage::user("search rust"),
            tool_call_message(),
            tool_result_message(),
            mixed,
            ChatMessage::user("   "),
            ChatMessage::user("thanks"),
        ]
    }

    #[test]
    fn test_inactive_removes_all_tool_structure() {
        let cleaned = clean_messages(&history(), false);
        assert!(!has_tool_content(&cleaned));
        let texts: Vec<String> = cleaned.iter().map(ChatMessage::text).collect();
        assert_eq!(texts, vec!["search rust", "Here is what I found", "thanks"]);
    }

    #[test]
    fn test_active_preserves_structure() {
        let cleaned = clean_messages(&history(), true);
        assert_eq!(cleaned.len(), 5, "only the blank user message is dropped");
        assert!(has_tool_content(&cleaned));
        assert_eq!(cleaned[2].role, MessageRole::Tool);
    }

    #[test]
    fn test_idempotent_in_both_modes() {
        for tools_active in [false, true] {
            let once = clean_messages(&history(), tools_active);
            let twice = clean_messages(&once, tools_active);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_attachment_only_message_survives() {
        let mut msg = ChatMessage::user("");
        msg.attachments.push(parley_types::chat::Attachment {
            name: None,
            content_type: Some("image/png".into()),
            url: "https://files/x.png".into(),
        });
        let cleaned = clean_messages(&[msg], false);
        assert_eq!(cleaned.len(), 1);
    }
}
