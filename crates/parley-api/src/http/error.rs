//! Application error type mapping to HTTP status codes.
//!
//! Error bodies are `{"error": "<message>"}`, plus `"code"` when the
//! client needs to branch on the failure (e.g. `DAILY_LIMIT_REACHED`).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use parley_types::error::{AgentError, ChatError, WorkspaceError};

#[derive(Debug)]
pub enum AppError {
    Chat(ChatError),
    Agent(AgentError),
    Workspace(WorkspaceError),
    /// Missing or invalid credentials.
    Unauthorized(String),
    Validation(String),
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        AppError::Agent(e)
    }
}

impl From<WorkspaceError> for AppError {
    fn from(e: WorkspaceError) -> Self {
        AppError::Workspace(e)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Chat(ChatError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Chat(
                ChatError::DailyLimitExceeded { .. } | ChatError::SpecialAgentLimitExceeded { .. },
            ) => StatusCode::FORBIDDEN,
            AppError::Chat(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Agent(AgentError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Agent(AgentError::SlugConflict(_)) => StatusCode::CONFLICT,
            AppError::Agent(AgentError::NotFound | AgentError::WorkspaceNotFound) => {
                StatusCode::NOT_FOUND
            }
            AppError::Agent(AgentError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Workspace(WorkspaceError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Workspace(WorkspaceError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Workspace(WorkspaceError::Forbidden) => StatusCode::FORBIDDEN,
            AppError::Workspace(WorkspaceError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Chat(e) => e.to_string(),
            AppError::Agent(e) => e.to_string(),
            AppError::Workspace(e) => e.to_string(),
            AppError::Unauthorized(msg) | AppError::Validation(msg) | AppError::Internal(msg) => {
                msg.clone()
            }
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            AppError::Chat(e) => e.code(),
            AppError::Agent(AgentError::SlugConflict(_)) => Some("SLUG_CONFLICT"),
            AppError::Unauthorized(_) => Some("UNAUTHORIZED"),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        }

        let body = match self.code() {
            Some(code) => json!({ "error": message, "code": code }),
            None => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}
