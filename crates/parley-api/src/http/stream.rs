//! Data-stream line protocol for streamed chat turns.
//!
//! One event per line, `<code>:<json>\n`:
//! - `0` text delta (JSON string)
//! - `9` tool call `{toolCallId, toolName, args}`
//! - `a` tool result `{toolCallId, result}`
//! - `e` step finish `{finishReason, usage, isContinued}`
//! - `d` finish `{finishReason, usage}`
//! - `3` error (JSON string), always the last line when present

use axum::body::{Body, Bytes};
use futures_util::StreamExt;
use serde_json::json;
use tokio_util::sync::DropGuard;
use tracing::warn;

use parley_core::chat::{TurnEvent, TurnEventStream};
use parley_types::llm::Usage;

/// Content type of a data-stream response body.
pub const DATA_STREAM_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

fn usage_json(usage: &Usage) -> serde_json::Value {
    json!({
        "promptTokens": usage.input_tokens,
        "completionTokens": usage.output_tokens,
    })
}

fn line(code: char, value: &serde_json::Value) -> String {
    format!("{code}:{value}\n")
}

pub fn encode_event(event: &TurnEvent) -> String {
    match event {
        TurnEvent::TextDelta(text) => line('0', &json!(text)),
        TurnEvent::ToolCall { id, name, args } => line(
            '9',
            &json!({ "toolCallId": id, "toolName": name, "args": args }),
        ),
        TurnEvent::ToolResult { id, result, .. } => {
            line('a', &json!({ "toolCallId": id, "result": result }))
        }
        TurnEvent::StepFinish {
            finish_reason,
            usage,
        } => line(
            'e',
            &json!({
                "finishReason": finish_reason.as_finish_reason(),
                "usage": usage_json(usage),
                "isContinued": false,
            }),
        ),
        TurnEvent::Finish {
            finish_reason,
            usage,
        } => line(
            'd',
            &json!({
                "finishReason": finish_reason.as_finish_reason(),
                "usage": usage_json(usage),
            }),
        ),
    }
}

pub fn encode_error(message: &str) -> String {
    line('3', &json!(message))
}

/// Encode a turn stream as a response body.
///
/// `first` is an event already taken from the stream. The guard cancels the
/// turn when the body is dropped, i.e. when the client disconnects.
pub fn data_stream_body(first: TurnEvent, rest: TurnEventStream, guard: DropGuard) -> Body {
    let lines = async_stream::stream! {
        let _guard = guard;
        yield Ok::<_, std::convert::Infallible>(Bytes::from(encode_event(&first)));

        let mut rest = rest;
        while let Some(item) = rest.next().await {
            match item {
                Ok(event) => yield Ok(Bytes::from(encode_event(&event))),
                Err(e) => {
                    warn!(error = %e, "turn failed after partial output");
                    yield Ok(Bytes::from(encode_error(&e.to_string())));
                    break;
                }
            }
        }
    };
    Body::from_stream(lines)
}
