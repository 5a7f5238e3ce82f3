//! OpenAI-compatible model provider.
//!
//! A single [`OpenAiCompatibleProvider`] serves any backend speaking the chat
//! completions protocol. Gemini models are reached through Google's
//! OpenAI-compatible endpoint.
//!
//! Uses [`async_openai`] for request/response types and SSE streaming.

pub mod config;
pub mod streaming;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestToolMessage,
    ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, ChatCompletionStreamOptions,
    CreateChatCompletionRequest,
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use parley_core::llm::{EventStream, LlmProvider};
use parley_types::chat::MessageRole;
use parley_types::llm::{CompletionRequest, LlmError, LlmMessage};

use self::config::OpenAiCompatConfig;
use self::streaming::map_openai_stream;

/// Provider for any OpenAI-compatible API.
///
/// Does not derive Debug; the API key lives inside the `async_openai::Client`.
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
        }
    }

    /// Google Gemini via the OpenAI-compatible endpoint at `base_url`.
    pub fn gemini(base_url: &str, api_key: SecretString) -> Self {
        Self::new(config::gemini_defaults(base_url, api_key))
    }

    fn build_request(request: &CompletionRequest) -> Result<CreateChatCompletionRequest, LlmError> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system.as_ref().filter(|s| !s.is_empty()) {
            messages.push(system_message(system));
        }
        for message in &request.messages {
            messages.push(to_request_message(message)?);
        }

        let mut req = CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        };

        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.input_schema,
                        }
                    })
                })
                .collect();
            req.tools = Some(from_wire(serde_json::Value::Array(tools))?);
        }

        req.stream = Some(true);
        req.stream_options = Some(ChatCompletionStreamOptions {
            include_usage: Some(true),
            include_obfuscation: None,
        });

        Ok(req)
    }
}

/// Decode a value from its chat completions wire form.
///
/// Tool and content-part shapes are built this way so they always match what
/// the endpoint accepts.
fn from_wire<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, LlmError> {
    serde_json::from_value(value)
        .map_err(|e| LlmError::InvalidRequest(format!("unrepresentable request field: {e}")))
}

fn system_message(text: &str) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
        content: ChatCompletionRequestSystemMessageContent::Text(text.to_string()),
        name: None,
    })
}

fn to_request_message(message: &LlmMessage) -> Result<ChatCompletionRequestMessage, LlmError> {
    Ok(match message.role {
        MessageRole::System => system_message(&message.content),
        MessageRole::User => {
            let images: Vec<&str> = message
                .attachments
                .iter()
                .filter(|a| a.is_image())
                .map(|a| a.url.as_str())
                .collect();
            let content = if images.is_empty() {
                ChatCompletionRequestUserMessageContent::Text(message.content.clone())
            } else {
                let mut parts = Vec::with_capacity(images.len() + 1);
                if !message.content.is_empty() {
                    parts.push(json!({"type": "text", "text": message.content}));
                }
                parts.extend(
                    images
                        .into_iter()
                        .map(|url| json!({"type": "image_url", "image_url": {"url": url}})),
                );
                from_wire(serde_json::Value::Array(parts))?
            };
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content,
                name: None,
            })
        }
        MessageRole::Assistant => {
            let tool_calls = if message.tool_calls.is_empty() {
                None
            } else {
                let calls: Vec<serde_json::Value> = message
                    .tool_calls
                    .iter()
                    .map(|c| {
                        json!({
                            "id": c.id,
                            "type": "function",
                            "function": {"name": c.name, "arguments": c.arguments.to_string()},
                        })
                    })
                    .collect();
                Some(from_wire(serde_json::Value::Array(calls))?)
            };
            let content = if message.content.is_empty() && tool_calls.is_some() {
                None
            } else {
                Some(ChatCompletionRequestAssistantMessageContent::Text(
                    message.content.clone(),
                ))
            };
            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content,
                refusal: None,
                name: None,
                audio: None,
                tool_calls,
                function_call: None,
            })
        }
        MessageRole::Tool => {
            let tool_call_id = message.tool_call_id.clone().ok_or_else(|| {
                LlmError::InvalidRequest("tool result without a tool call id".into())
            })?;
            ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
                content: ChatCompletionRequestToolMessageContent::Text(message.content.clone()),
                tool_call_id,
            })
        }
    })
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let oai_request = match Self::build_request(&request) {
            Ok(r) => r,
            Err(e) => return Box::pin(futures_util::stream::once(async move { Err(e) })),
        };
        debug!(
            provider = %self.provider_name,
            model = %oai_request.model,
            messages = oai_request.messages.len(),
            tools = request.tools.len(),
            "opening completion stream"
        );

        let client = self.client.clone();
        Box::pin(async_stream::try_stream! {
            let oai_stream = client
                .chat()
                .create_stream(oai_request)
                .await
                .map_err(map_openai_error)?;

            let mut events = map_openai_stream(oai_stream);
            while let Some(event) = futures_util::StreamExt::next(&mut events).await {
                yield event?;
            }
        })
    }
}

/// Map async-openai errors to [`LlmError`].
pub(crate) fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "authentication_error"
                || error_type == "authentication_error"
                || api_err.message.contains("API key not valid")
                || api_err.message.contains("Invalid API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded"
                || error_type == "rate_limit_error"
                || code == "RESOURCE_EXHAUSTED"
            {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if error_type == "invalid_request_error" || code == "INVALID_ARGUMENT" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: api_err.message.clone(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401 | 403) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::StreamError(stream_err) => LlmError::Stream(stream_err.to_string()),
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}
