//! OpenAI SSE stream to [`StreamEvent`] adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] to the
//! provider-agnostic [`StreamEvent`] enum.
//!
//! Tool call arguments arrive as partial JSON fragments across chunks. They
//! are accumulated and emitted as [`StreamEvent::ToolUseComplete`] when a
//! finish reason arrives, or at the end of the stream for backends that
//! never send one.

use std::collections::HashMap;

use async_openai::types::chat::{ChatCompletionResponseStream, FinishReason};
use futures_util::StreamExt;
use tracing::trace;

use parley_core::llm::EventStream;
use parley_types::llm::{LlmError, StopReason, StreamEvent, Usage};

use super::map_openai_error;

/// Accumulates partial JSON fragments for a tool call during streaming.
#[derive(Default)]
struct ToolCallAccumulator {
    id: String,
    name: String,
    json_buffer: String,
}

/// Tool calls of one step, in arrival order.
///
/// A fragment continues the call last seen at its index unless it carries a
/// different id. Gemini sends parallel calls that all share index 0, each
/// with its own id, so those open new slots.
#[derive(Default)]
struct ToolCallSlots {
    slots: Vec<ToolCallAccumulator>,
    by_index: HashMap<u32, usize>,
}

impl ToolCallSlots {
    fn push(
        &mut self,
        index: u32,
        id: Option<String>,
        name: Option<String>,
        arguments: Option<String>,
    ) {
        let id = id.filter(|id| !id.is_empty());
        let current = self.by_index.get(&index).copied().filter(|&slot| {
            let existing = &self.slots[slot].id;
            match &id {
                Some(id) => existing.is_empty() || existing == id,
                None => true,
            }
        });
        let slot = match current {
            Some(slot) => slot,
            None => {
                self.slots.push(ToolCallAccumulator::default());
                let slot = self.slots.len() - 1;
                self.by_index.insert(index, slot);
                slot
            }
        };

        let acc = &mut self.slots[slot];
        if let Some(id) = id {
            acc.id = id;
        }
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            acc.name = name;
        }
        if let Some(arguments) = arguments {
            acc.json_buffer.push_str(&arguments);
        }
    }

    fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn drain(&mut self) -> Result<Vec<StreamEvent>, LlmError> {
        self.by_index.clear();
        std::mem::take(&mut self.slots)
            .into_iter()
            .map(|acc| {
                let input = if acc.json_buffer.trim().is_empty() {
                    serde_json::Value::Object(Default::default())
                } else {
                    serde_json::from_str(&acc.json_buffer).map_err(|e| {
                        LlmError::Deserialization(format!("tool call JSON for '{}': {e}", acc.name))
                    })?
                };
                Ok(StreamEvent::ToolUseComplete {
                    id: acc.id,
                    name: acc.name,
                    input,
                })
            })
            .collect()
    }
}

fn stop_reason(finish_reason: &FinishReason) -> StopReason {
    match finish_reason {
        FinishReason::Stop => StopReason::EndTurn,
        FinishReason::Length => StopReason::MaxTokens,
        FinishReason::ToolCalls | FinishReason::FunctionCall => StopReason::ToolUse,
        FinishReason::ContentFilter => StopReason::ContentFilter,
    }
}

/// Map an async-openai [`ChatCompletionResponseStream`] to [`StreamEvent`]s.
///
/// Emits `Connected` first and `Done` last. Stream-level failures surface as
/// an `Err` item and end the stream.
pub fn map_openai_stream(mut stream: ChatCompletionResponseStream) -> EventStream {
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        let mut calls = ToolCallSlots::default();
        let mut finished = false;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(map_openai_error)?;
            trace!(choices = chunk.choices.len(), "openai chunk");

            if let Some(usage) = &chunk.usage {
                yield StreamEvent::Usage(Usage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                });
            }

            for choice in chunk.choices {
                if let Some(text) = choice.delta.content {
                    if !text.is_empty() {
                        yield StreamEvent::TextDelta { text };
                    }
                }

                for call in choice.delta.tool_calls.unwrap_or_default() {
                    let (name, arguments) = match call.function {
                        Some(function) => (function.name, function.arguments),
                        None => (None, None),
                    };
                    calls.push(call.index, call.id, name, arguments);
                }

                if let Some(reason) = choice.finish_reason {
                    let had_calls = !calls.is_empty();
                    for event in calls.drain()? {
                        yield event;
                    }
                    // Gemini reports "stop" even when the step ended in tool calls.
                    let reason = if had_calls { StopReason::ToolUse } else { stop_reason(&reason) };
                    finished = true;
                    yield StreamEvent::MessageDelta { stop_reason: reason };
                }
            }
        }

        if !calls.is_empty() {
            for event in calls.drain()? {
                yield event;
            }
            yield StreamEvent::MessageDelta { stop_reason: StopReason::ToolUse };
        } else if !finished {
            yield StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn };
        }

        yield StreamEvent::Done;
    })
}
