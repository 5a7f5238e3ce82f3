//! The streamed model call of a turn, including tool steps.
//!
//! `stream_model_turn` drives the provider stream step by step. Text and
//! tool events are forwarded as they arrive. When a step ends with tool
//! calls, the tools run, their results are appended to the conversation
//! and the next step starts, up to `max_steps`.
//!
//! Error and completion handling:
//! - an upstream error is captured; the current step is drained, no further
//!   step starts, and the error is yielded as the final item;
//! - `on_finish` runs exactly once, only after a clean drain, before the
//!   final `Finish` event;
//! - cancellation stops consuming upstream and ends the stream without
//!   `on_finish`.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use parley_types::chat::{ChatMessage, MessagePart, MessageRole, StreamOutcome};
use parley_types::error::ChatError;
use parley_types::llm::{CompletionRequest, LlmMessage, StopReason, StreamEvent, ToolCall, Usage};

use crate::llm::BoxLlmProvider;
use crate::tools::ToolSet;

/// Events of a turn as seen by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    TextDelta(String),
    ToolCall {
        id: String,
        name: String,
        args: serde_json::Value,
    },
    ToolResult {
        id: String,
        name: String,
        result: serde_json::Value,
    },
    /// A tool step ended and the next one follows.
    StepFinish {
        finish_reason: StopReason,
        usage: Usage,
    },
    /// The turn completed. Always the last item of a clean stream.
    Finish {
        finish_reason: StopReason,
        usage: Usage,
    },
}

pub type TurnEventStream = Pin<Box<dyn Stream<Item = Result<TurnEvent, ChatError>> + Send>>;

/// Everything needed for the model part of one turn.
pub struct ModelTurn {
    pub provider: BoxLlmProvider,
    pub model: String,
    pub system: String,
    pub messages: Vec<LlmMessage>,
    pub tools: ToolSet,
    pub max_steps: u32,
}

pub fn stream_model_turn<F>(
    turn: ModelTurn,
    cancel: CancellationToken,
    on_finish: F,
) -> TurnEventStream
where
    F: FnOnce(StreamOutcome) + Send + 'static,
{
    let ModelTurn {
        provider,
        model,
        system,
        mut messages,
        tools,
        max_steps,
    } = turn;

    Box::pin(async_stream::stream! {
        let tool_definitions = tools.definitions();
        let mut outcome = StreamOutcome::default();
        let mut captured: Option<ChatError> = None;

        for step in 1..=max_steps.max(1) {
            let request = CompletionRequest {
                model: model.clone(),
                messages: messages.clone(),
                system: Some(system.clone()),
                tools: tool_definitions.clone(),
                max_tokens: None,
                temperature: None,
            };
            let mut upstream = provider.stream(request);

            let mut step_text = String::new();
            let mut calls: Vec<ToolCall> = Vec::new();
            let mut stop_reason = StopReason::EndTurn;
            let mut step_usage = Usage::default();

            loop {
                let next = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    next = upstream.next() => Some(next),
                };
                let Some(next) = next else {
                    debug!(model = %model, step, "turn cancelled");
                    return;
                };

                match next {
                    None | Some(Ok(StreamEvent::Done)) => break,
                    Some(Ok(StreamEvent::TextDelta { text })) => {
                        if !text.is_empty() {
                            step_text.push_str(&text);
                            yield Ok(TurnEvent::TextDelta(text));
                        }
                    }
                    Some(Ok(StreamEvent::ToolUseComplete { id, name, input })) => {
                        yield Ok(TurnEvent::ToolCall {
                            id: id.clone(),
                            name: name.clone(),
                            args: input.clone(),
                        });
                        calls.push(ToolCall { id, name, arguments: input });
                    }
                    Some(Ok(StreamEvent::MessageDelta { stop_reason: reason })) => stop_reason = reason,
                    Some(Ok(StreamEvent::Usage(usage))) => step_usage = usage,
                    Some(Ok(StreamEvent::Connected)) => {}
                    Some(Err(e)) => {
                        error!(model = %model, step, error = %e, "model stream error");
                        if captured.is_none() {
                            captured = Some(ChatError::Stream(e.to_string()));
                        }
                    }
                }
            }

            outcome.steps = step;
            outcome.usage.add(step_usage);
            outcome.finish_reason = stop_reason;
            outcome.text.push_str(&step_text);

            if captured.is_some() {
                break;
            }

            if !step_text.is_empty() || !calls.is_empty() {
                let mut assistant = ChatMessage::assistant(step_text.clone());
                assistant.parts = calls
                    .iter()
                    .map(|c| MessagePart::ToolCall {
                        tool_call_id: c.id.clone(),
                        tool_name: c.name.clone(),
                        args: c.arguments.clone(),
                    })
                    .collect();
                outcome.messages.push(assistant);
            }

            if calls.is_empty() || tools.is_empty() {
                break;
            }

            let mut assistant = LlmMessage::assistant(step_text);
            assistant.tool_calls = calls.clone();
            messages.push(assistant);

            let mut results = ChatMessage::new(MessageRole::Tool, "");
            for call in calls {
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    result = tools.call(&call.name, call.arguments.clone()) => Some(result),
                };
                let Some(result) = result else {
                    debug!(model = %model, step, tool = %call.name, "turn cancelled during tool call");
                    return;
                };
                let result = result.unwrap_or_else(|e| {
                    warn!(tool = %call.name, error = %e, "tool call failed");
                    json!({ "error": e.to_string() })
                });

                yield Ok(TurnEvent::ToolResult {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    result: result.clone(),
                });
                messages.push(LlmMessage::tool_result(call.id.clone(), result.to_string()));
                results.parts.push(MessagePart::ToolResult {
                    tool_call_id: call.id,
                    tool_name: call.name,
                    result,
                });
            }
            outcome.messages.push(results);

            if step < max_steps {
                yield Ok(TurnEvent::StepFinish {
                    finish_reason: stop_reason,
                    usage: step_usage,
                });
            }
        }

        if let Some(err) = captured {
            yield Err(err);
            return;
        }

        let finish_reason = outcome.finish_reason;
        let usage = outcome.usage;
        info!(
            model = %model,
            steps = outcome.steps,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            finish_reason = %finish_reason,
            "turn finished"
        );
        on_finish(outcome);
        yield Ok(TurnEvent::Finish { finish_reason, usage });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, Step, collect_events};
    use crate::tools::Tool;
    use parley_types::error::ToolError;
    use parley_types::llm::{LlmError, ToolDefinition};
    use std::sync::{Arc, Mutex};

    struct Upper {
        definition: ToolDefinition,
    }

    impl Upper {
        fn new() -> Self {
            Self {
                definition: ToolDefinition {
                    name: "upper".into(),
                    description: "Uppercase text".into(),
                    input_schema: json!({"type": "object"}),
                },
            }
        }
    }

    impl Tool for Upper {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn call(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
            match arguments.get("text").and_then(|t| t.as_str()) {
                Some(text) => Ok(json!(text.to_uppercase())),
                None => Err(ToolError::Call {
                    tool: "upper".into(),
                    message: "missing text".into(),
                }),
            }
        }
    }

    fn turn(provider: ScriptedProvider, tools: ToolSet, max_steps: u32) -> ModelTurn {
        ModelTurn {
            provider: BoxLlmProvider::new(provider),
            model: "test-model".into(),
            system: "be brief".into(),
            messages: vec![LlmMessage::user("hi")],
            tools,
            max_steps,
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<StreamOutcome>>>, impl FnOnce(StreamOutcome) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |outcome| sink.lock().unwrap().push(outcome))
    }

    #[tokio::test]
    async fn test_text_only_turn_finishes_once() {
        let provider = ScriptedProvider::new(vec![Step::text(&["Hel", "lo"])]);
        let (seen, on_finish) = recorder();

        let events = collect_events(stream_model_turn(
            turn(provider, ToolSet::new(), 10),
            CancellationToken::new(),
            on_finish,
        ))
        .await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].as_ref().unwrap(), &TurnEvent::TextDelta("Hel".into()));
        assert!(matches!(
            events[2].as_ref().unwrap(),
            TurnEvent::Finish { finish_reason: StopReason::EndTurn, .. }
        ));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].text, "Hello");
        assert_eq!(seen[0].messages, vec![ChatMessage::assistant("Hello")]);
        assert_eq!(seen[0].steps, 1);
    }

    #[tokio::test]
    async fn test_tool_step_feeds_result_into_next_step() {
        let provider = ScriptedProvider::new(vec![
            Step::tool_call("c1", "upper", json!({"text": "abc"})),
            Step::text(&["Done: ABC"]),
        ]);
        let requests = provider.requests();
        let mut tools = ToolSet::new();
        tools.insert(Upper::new());
        let (seen, on_finish) = recorder();

        let events = collect_events(stream_model_turn(
            turn(provider, tools, 10),
            CancellationToken::new(),
            on_finish,
        ))
        .await;
        let events: Vec<TurnEvent> = events.into_iter().map(Result::unwrap).collect();

        assert!(matches!(&events[0], TurnEvent::ToolCall { name, .. } if name == "upper"));
        assert!(matches!(&events[1], TurnEvent::ToolResult { result, .. } if result == &json!("ABC")));
        assert!(matches!(&events[2], TurnEvent::StepFinish { finish_reason: StopReason::ToolUse, .. }));
        assert_eq!(events[3], TurnEvent::TextDelta("Done: ABC".into()));
        assert!(matches!(&events[4], TurnEvent::Finish { .. }));

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        let second = &requests[1].messages;
        assert_eq!(second[1].tool_calls[0].id, "c1");
        assert_eq!(second[2].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(second[2].content, "\"ABC\"");

        let outcome = &seen.lock().unwrap()[0];
        assert_eq!(outcome.steps, 2);
        let roles: Vec<MessageRole> = outcome.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::Assistant, MessageRole::Tool, MessageRole::Assistant]
        );
    }

    #[tokio::test]
    async fn test_failing_tool_reports_error_result_and_continues() {
        let provider = ScriptedProvider::new(vec![
            Step::tool_call("c1", "upper", json!({})),
            Step::text(&["sorry"]),
        ]);
        let mut tools = ToolSet::new();
        tools.insert(Upper::new());
        let (_seen, on_finish) = recorder();

        let events = collect_events(stream_model_turn(
            turn(provider, tools, 10),
            CancellationToken::new(),
            on_finish,
        ))
        .await;

        let result = events
            .iter()
            .find_map(|e| match e {
                Ok(TurnEvent::ToolResult { result, .. }) => Some(result.clone()),
                _ => None,
            })
            .unwrap();
        assert!(result["error"].as_str().unwrap().contains("missing text"));
        assert!(matches!(events.last().unwrap(), Ok(TurnEvent::Finish { .. })));
    }

    #[tokio::test]
    async fn test_step_cap_stops_tool_loop() {
        let provider = ScriptedProvider::new(vec![
            Step::tool_call("c1", "upper", json!({"text": "a"})),
            Step::tool_call("c2", "upper", json!({"text": "b"})),
            Step::tool_call("c3", "upper", json!({"text": "c"})),
        ]);
        let requests = provider.requests();
        let mut tools = ToolSet::new();
        tools.insert(Upper::new());
        let (seen, on_finish) = recorder();

        let events = collect_events(stream_model_turn(
            turn(provider, tools, 2),
            CancellationToken::new(),
            on_finish,
        ))
        .await;

        assert_eq!(requests.lock().unwrap().len(), 2);
        assert!(matches!(
            events.last().unwrap(),
            Ok(TurnEvent::Finish { finish_reason: StopReason::ToolUse, .. })
        ));
        assert_eq!(seen.lock().unwrap()[0].steps, 2);
    }

    #[tokio::test]
    async fn test_error_after_partial_output_is_raised_after_drain() {
        let provider = ScriptedProvider::new(vec![Step::text_then_error(
            &["partial ", "answer"],
            LlmError::Stream("connection reset".into()),
        )]);
        let (seen, on_finish) = recorder();

        let events = collect_events(stream_model_turn(
            turn(provider, ToolSet::new(), 10),
            CancellationToken::new(),
            on_finish,
        ))
        .await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].as_ref().unwrap(), &TurnEvent::TextDelta("partial ".into()));
        assert_eq!(events[1].as_ref().unwrap(), &TurnEvent::TextDelta("answer".into()));
        assert!(matches!(&events[2], Err(ChatError::Stream(msg)) if msg.contains("connection reset")));
        assert!(seen.lock().unwrap().is_empty(), "on_finish must not run after an error");
    }

    #[tokio::test]
    async fn test_cancelled_turn_skips_on_finish() {
        let provider = ScriptedProvider::new(vec![Step::text(&["never"])]);
        let (seen, on_finish) = recorder();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let events = collect_events(stream_model_turn(
            turn(provider, ToolSet::new(), 10),
            cancel,
            on_finish,
        ))
        .await;

        assert!(events.is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }
}
