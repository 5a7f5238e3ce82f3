//! Built-in tools bound from an agent's static tool list.

pub mod exa;

use tracing::warn;

use parley_core::tools::catalog::{self, ToolKind, WEB_SEARCH};
use parley_core::tools::{StaticToolProvider, ToolSet};
use parley_types::config::EndpointConfig;

use crate::llm::resolve_api_key;

use self::exa::WebSearchTool;

/// Binds catalog ids to the tools this server can execute.
pub struct BuiltinToolProvider {
    search: EndpointConfig,
}

impl BuiltinToolProvider {
    pub fn new(search: EndpointConfig) -> Self {
        Self { search }
    }

    fn web_search(&self) -> Option<WebSearchTool> {
        let Some(api_key) = resolve_api_key(&self.search) else {
            warn!(env = %self.search.api_key_env, "web search requested but no API key is set");
            return None;
        };
        match WebSearchTool::new(&self.search.base_url, api_key) {
            Ok(tool) => Some(tool),
            Err(e) => {
                warn!(error = %e, "web search unavailable");
                None
            }
        }
    }
}

impl StaticToolProvider for BuiltinToolProvider {
    fn bind(&self, tool_ids: &[String]) -> ToolSet {
        let mut tools = ToolSet::new();
        for id in tool_ids {
            match catalog::lookup(id) {
                Some(entry) if entry.kind == ToolKind::Callable && entry.available => {
                    if entry.id == WEB_SEARCH {
                        if let Some(tool) = self.web_search() {
                            tools.insert(tool);
                        }
                    }
                }
                Some(_) => {}
                None => warn!(tool = %id, "unknown tool id on agent, skipping"),
            }
        }
        tools
    }
}
