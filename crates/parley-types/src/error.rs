use thiserror::Error;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors that end a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("daily message limit of {limit} reached")]
    DailyLimitExceeded { limit: u32 },

    #[error("daily special agent limit of {limit} reached")]
    SpecialAgentLimitExceeded { limit: u32 },

    #[error("Model {0} not found")]
    ModelNotFound(String),

    #[error("model provider unavailable: {0}")]
    Provider(String),

    #[error("agent '{0}' not found")]
    AgentNotFound(String),

    #[error("tool discovery failed: {0}")]
    ToolDiscovery(String),

    #[error("{0}")]
    Stream(String),

    #[error("storage error: {0}")]
    Repository(String),
}

impl ChatError {
    /// Machine-readable code sent alongside the message, when one exists.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ChatError::DailyLimitExceeded { .. } => Some("DAILY_LIMIT_REACHED"),
            ChatError::SpecialAgentLimitExceeded { .. } => Some("DAILY_SPECIAL_AGENT_LIMIT_REACHED"),
            _ => None,
        }
    }
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        ChatError::Repository(e.to_string())
    }
}

/// Errors from tool discovery and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool server unreachable: {0}")]
    Transport(String),

    #[error("tool server protocol error: {0}")]
    Protocol(String),

    #[error("tool '{0}' not found")]
    NotFound(String),

    #[error("tool '{tool}' failed: {message}")]
    Call { tool: String, message: String },

    #[error("tool not configured: {0}")]
    NotConfigured(String),
}

/// Errors related to agent management.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0}")]
    Validation(String),

    #[error("This Model ID is already taken.")]
    SlugConflict(String),

    #[error("agent not found")]
    NotFound,

    #[error("Workspace not found")]
    WorkspaceNotFound,

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for AgentError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => AgentError::NotFound,
            RepositoryError::Conflict(slug) => AgentError::SlugConflict(slug),
            other => AgentError::Storage(other.to_string()),
        }
    }
}

/// Errors related to workspace management.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("{0}")]
    Validation(String),

    #[error("Workspace not found")]
    NotFound,

    #[error("You do not have permission to delete this workspace")]
    Forbidden,

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for WorkspaceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => WorkspaceError::NotFound,
            other => WorkspaceError::Storage(other.to_string()),
        }
    }
}
