//! MCP client over Streamable HTTP, built on the `rmcp` SDK.
//!
//! A client owns one running rmcp session. The handshake happens in
//! [`McpClient::connect`]; the session id the server returns is replayed by
//! the transport on every later request.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use rmcp::model::{
    CallToolRequestParam, ClientCapabilities, ClientInfo, Implementation, LoggingLevel,
    LoggingMessageNotificationParam, ProtocolVersion, RawContent,
};
use rmcp::service::{NotificationContext, RunningService, ServiceError};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::{ClientHandler, RoleClient};
use tracing::{debug, info, warn};

use parley_types::error::ToolError;
use parley_types::llm::ToolDefinition;

#[derive(Clone)]
struct ParleyClientHandler {
    info: ClientInfo,
}

impl ClientHandler for ParleyClientHandler {
    fn get_info(&self) -> ClientInfo {
        self.info.clone()
    }

    async fn on_logging_message(
        &self,
        params: LoggingMessageNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) {
        let LoggingMessageNotificationParam {
            level,
            logger,
            data,
        } = params;
        match level {
            LoggingLevel::Critical
            | LoggingLevel::Alert
            | LoggingLevel::Emergency
            | LoggingLevel::Error
            | LoggingLevel::Warning => {
                warn!(?level, logger = ?logger, %data, "mcp server log message");
            }
            _ => debug!(?level, logger = ?logger, %data, "mcp server log message"),
        }
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        protocol_version: ProtocolVersion::LATEST,
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "parley".to_string(),
            title: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            icons: None,
            website_url: None,
        },
    }
}

pub struct McpClient {
    url: String,
    timeout: Duration,
    service: RunningService<RoleClient, ParleyClientHandler>,
}

impl McpClient {
    /// Open a session with the server at `url`, sending `headers` on every
    /// request. Fails with [`ToolError::Transport`] when the handshake does
    /// not complete within `timeout`.
    pub async fn connect(
        url: impl Into<String>,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, ToolError> {
        let url = url.into();
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .default_headers(build_headers(headers))
            .build()
            .map_err(|e| ToolError::Transport(format!("failed to create HTTP client: {e}")))?;
        let transport = StreamableHttpClientTransport::with_client(
            http,
            StreamableHttpClientTransportConfig::with_uri(url.clone()),
        );

        let handler = ParleyClientHandler {
            info: client_info(),
        };
        let service = tokio::time::timeout(timeout, rmcp::serve_client(handler, transport))
            .await
            .map_err(|_| {
                ToolError::Transport(format!("timed out connecting to {url} after {timeout:?}"))
            })?
            .map_err(|e| ToolError::Transport(format!("handshake with {url} failed: {e}")))?;

        info!(
            url = %url,
            server = ?service.peer().peer_info().map(|i| i.server_info.name.clone()),
            "mcp session initialized"
        );
        Ok(Self {
            url,
            timeout,
            service,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// All tools the server exposes, across every `tools/list` page.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ToolError> {
        let tools = tokio::time::timeout(self.timeout, self.service.peer().list_all_tools())
            .await
            .map_err(|_| ToolError::Transport(format!("tools/list timed out: {}", self.url)))?
            .map_err(service_error)?;

        Ok(tools
            .into_iter()
            .map(|tool| ToolDefinition {
                name: tool.name.to_string(),
                description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
                input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
            })
            .collect())
    }

    /// Invoke a tool and return its raw result. A result flagged `isError`
    /// becomes [`ToolError::Call`].
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let arguments = match arguments {
            serde_json::Value::Null => None,
            serde_json::Value::Object(map) => Some(map),
            other => {
                return Err(ToolError::Call {
                    tool: name.to_string(),
                    message: format!("arguments must be an object, got {other}"),
                });
            }
        };

        let call = self.service.peer().call_tool(CallToolRequestParam {
            name: name.to_string().into(),
            arguments,
        });
        let result = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ToolError::Transport(format!("tools/call '{name}' timed out")))?
            .map_err(service_error)?;

        if result.is_error.unwrap_or(false) {
            let message = result
                .content
                .iter()
                .filter_map(|c| match &c.raw {
                    RawContent::Text(text) => Some(text.text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ToolError::Call {
                tool: name.to_string(),
                message,
            });
        }
        serde_json::to_value(&result)
            .map_err(|e| ToolError::Protocol(format!("unserializable tools/call result: {e}")))
    }
}

fn service_error(err: ServiceError) -> ToolError {
    match err {
        ServiceError::McpError(error) => {
            ToolError::Protocol(format!("{}: {}", error.code.0, error.message))
        }
        other => ToolError::Transport(other.to_string()),
    }
}

fn build_headers(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let Ok(name) = HeaderName::try_from(name.as_str()) else {
            warn!(header = %name, "invalid MCP header name, skipping");
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value.trim()) else {
            warn!(header = %name, "invalid MCP header value, skipping");
            continue;
        };
        map.insert(name, value);
    }
    if !map.contains_key(USER_AGENT) {
        map.insert(USER_AGENT, HeaderValue::from_static("parley-mcp-client"));
    }
    map
}
