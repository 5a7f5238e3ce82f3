//! Agent records, their remote tool-server descriptor, and the per-turn
//! resolved configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Default number of model steps stored on a new agent.
pub const DEFAULT_AGENT_MAX_STEPS: u32 = 5;

/// A named value substituted for `{{name}}` in an MCP server URL or header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpVariable {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Address and transport details of a remote MCP tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpConfig {
    pub server: String,
    #[serde(default)]
    pub variables: Vec<McpVariable>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl McpConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            variables: Vec::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Replace every `{{name}}` placeholder in `input` with its variable value.
    pub fn substitute(&self, input: &str) -> String {
        self.variables.iter().fold(input.to_string(), |acc, var| {
            acc.replace(&format!("{{{{{}}}}}", var.name), &var.value)
        })
    }

    /// Server URL with variables applied.
    pub fn resolved_server(&self) -> String {
        self.substitute(&self.server)
    }

    /// Headers with variables applied to their values.
    pub fn resolved_headers(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .map(|(k, v)| (k.clone(), self.substitute(v)))
            .collect()
    }
}

/// A stored agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub avatar_url: Option<String>,
    pub system_prompt: String,
    pub model_preference: Option<String>,
    pub mcp_config: Option<McpConfig>,
    pub example_inputs: Vec<String>,
    pub tools: Vec<String>,
    pub remixable: bool,
    pub is_public: bool,
    pub max_steps: u32,
    pub creator_id: String,
    pub workspace_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Body of an agent creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "systemPrompt")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    /// Requested slug; generated from the name when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub model_preference: Option<String>,
    #[serde(default)]
    pub mcp_config: Option<McpConfig>,
    /// `owner/repo` of a GitHub repository served through git-mcp.
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub example_inputs: Option<Vec<String>>,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    #[serde(default)]
    pub remixable: Option<bool>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub max_steps: Option<u32>,
}

/// Agent configuration resolved for a single turn. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub id: Uuid,
    pub slug: String,
    pub system_prompt: String,
    pub tools: Vec<String>,
    pub mcp_config: Option<McpConfig>,
}

impl From<Agent> for AgentConfig {
    fn from(agent: Agent) -> Self {
        Self {
            id: agent.id,
            slug: agent.slug,
            system_prompt: agent.system_prompt,
            tools: agent.tools,
            mcp_config: agent.mcp_config,
        }
    }
}

impl AgentConfig {
    pub fn has_static_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    pub fn has_remote_tools(&self) -> bool {
        self.mcp_config.is_some()
    }
}

/// Agents visible on the agents page: curated ones plus the caller's own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentListing {
    pub curated: Vec<Agent>,
    pub user_agents: Vec<Agent>,
}

/// Convert a display name into a URL-safe slug.
///
/// Accented letters are transliterated, hyphens count as separators and
/// any other punctuation is dropped.
///
/// ```
/// use parley_types::agent::slugify;
///
/// assert_eq!(slugify("Research Assistant"), "research-assistant");
/// assert_eq!(slugify("My  Cool  Agent!"), "my-cool-agent");
/// assert_eq!(slugify("Assistant Créatif"), "assistant-creatif");
/// ```
pub fn slugify(name: &str) -> String {
    let ascii: String = deunicode::deunicode(name)
        .chars()
        .filter_map(|c| match c {
            '-' => Some(' '),
            c if c.is_ascii_alphanumeric() || c.is_whitespace() => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect();
    ascii.split_whitespace().collect::<Vec<_>>().join("-")
}
