//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Query parameters for the agents listing.
#[derive(Debug, Deserialize, Default)]
pub struct AgentListQuery {
    /// Restrict the caller's agents to one workspace.
    pub workspace_id: Option<String>,
}
