//! Binds the tools of a remote MCP server into a [`ToolSet`].

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use parley_core::tools::{RemoteToolLoader, Tool, ToolSet};
use parley_types::agent::McpConfig;
use parley_types::error::ToolError;
use parley_types::llm::ToolDefinition;

use super::client::McpClient;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A remote tool; calls go through the session that discovered it.
struct McpTool {
    client: Arc<McpClient>,
    definition: ToolDefinition,
}

impl McpTool {
    fn new(client: Arc<McpClient>, definition: ToolDefinition) -> Self {
        Self { client, definition }
    }
}

impl Tool for McpTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        self.client.call_tool(&self.definition.name, arguments).await
    }
}

#[derive(Debug, Clone)]
pub struct McpToolLoader {
    timeout: Duration,
}

impl McpToolLoader {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for McpToolLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteToolLoader for McpToolLoader {
    async fn load_tools(&self, config: &McpConfig) -> Result<ToolSet, ToolError> {
        let url = config.resolved_server();
        let client = Arc::new(
            McpClient::connect(url.clone(), &config.resolved_headers(), self.timeout).await?,
        );
        let definitions = client.list_tools().await?;

        let mut tools = ToolSet::new();
        for definition in definitions {
            tools.insert(McpTool::new(client.clone(), definition));
        }
        info!(url = %url, tools = tools.len(), "remote tools loaded");
        Ok(tools)
    }
}
