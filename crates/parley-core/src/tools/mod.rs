//! Tool abstractions: callable tools, tool sets, the static catalog, and the
//! ports through which agents get their tools bound.

pub mod catalog;
pub mod set;
pub mod tool;

use std::future::Future;

use parley_types::agent::McpConfig;
use parley_types::error::ToolError;

pub use set::ToolSet;
pub use tool::{BoxTool, Tool};

/// Discovers the tools exposed by a remote tool server and binds them.
///
/// Implementations live in parley-infra (e.g., `McpToolLoader`).
pub trait RemoteToolLoader: Send + Sync {
    fn load_tools(
        &self,
        config: &McpConfig,
    ) -> impl Future<Output = Result<ToolSet, ToolError>> + Send;
}

/// Binds tool ids from an agent's static tool list to callable tools.
///
/// Ids that are capability flags or unavailable produce no entry.
pub trait StaticToolProvider: Send + Sync {
    fn bind(&self, tool_ids: &[String]) -> ToolSet;
}
