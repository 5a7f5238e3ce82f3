//! Global configuration types for Parley.
//!
//! `GlobalConfig` represents the top-level `config.toml` in the data
//! directory. Every section and field has a default, so an empty or partial
//! file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub usage: UsageLimits,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// When a turn counts against the special-agent counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialUsagePolicy {
    /// Only agents with static tool bindings and no MCP server.
    #[default]
    StaticToolsOnly,
    /// Any agent with static tools or an MCP server.
    AllToolAgents,
    Disabled,
}

impl SpecialUsagePolicy {
    pub fn applies(&self, has_static_tools: bool, has_remote_tools: bool) -> bool {
        match self {
            SpecialUsagePolicy::StaticToolsOnly => has_static_tools && !has_remote_tools,
            SpecialUsagePolicy::AllToolAgents => has_static_tools || has_remote_tools,
            SpecialUsagePolicy::Disabled => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_system_prompt")]
    pub default_system_prompt: String,
    /// Upper bound on model steps per turn when tools are active.
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: u32,
    #[serde(default)]
    pub special_usage_policy: SpecialUsagePolicy,
    /// Additional case-insensitive regexes recognized as author questions.
    #[serde(default)]
    pub extra_author_patterns: Vec<String>,
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_max_tool_steps() -> u32 {
    10
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_system_prompt: default_system_prompt(),
            max_tool_steps: default_max_tool_steps(),
            special_usage_policy: SpecialUsagePolicy::default(),
            extra_author_patterns: Vec::new(),
        }
    }
}

/// Daily usage thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimits {
    #[serde(default = "default_daily_limit_anonymous")]
    pub daily_limit_anonymous: u32,
    #[serde(default = "default_daily_limit_authenticated")]
    pub daily_limit_authenticated: u32,
    #[serde(default = "default_daily_special_agent_limit")]
    pub daily_special_agent_limit: u32,
}

fn default_daily_limit_anonymous() -> u32 {
    5
}

fn default_daily_limit_authenticated() -> u32 {
    1000
}

fn default_daily_special_agent_limit() -> u32 {
    10
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self {
            daily_limit_anonymous: default_daily_limit_anonymous(),
            daily_limit_authenticated: default_daily_limit_authenticated(),
            daily_special_agent_limit: default_daily_special_agent_limit(),
        }
    }
}

impl UsageLimits {
    pub fn message_limit(&self, is_authenticated: bool) -> u32 {
        if is_authenticated {
            self.daily_limit_authenticated
        } else {
            self.daily_limit_anonymous
        }
    }
}

/// One upstream HTTP API: where it lives and which env var holds its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_google")]
    pub google: EndpointConfig,
    #[serde(default = "default_exa")]
    pub exa: EndpointConfig,
}

fn default_google() -> EndpointConfig {
    EndpointConfig {
        base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
        api_key_env: "GOOGLE_GENERATIVE_AI_API_KEY".to_string(),
    }
}

fn default_exa() -> EndpointConfig {
    EndpointConfig {
        base_url: "https://api.exa.ai".to_string(),
        api_key_env: "EXA_API_KEY".to_string(),
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            google: default_google(),
            exa: default_exa(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Slugs of the agents featured for every user.
    #[serde(default)]
    pub curated_slugs: Vec<String>,
}
