//! Agent endpoints.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use parley_types::agent::{AgentListing, CreateAgentRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::{AuthenticatedUser, MaybeUser};
use crate::http::extractors::query::AgentListQuery;
use crate::state::AppState;

/// POST /api/create-agent
pub async fn create_agent(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateAgentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let agent = state
        .agent_service
        .create_agent(&user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "agent": agent }))))
}

/// GET /api/agents?workspace_id=
///
/// Curated agents for everyone; the caller's own agents when authenticated.
pub async fn list_agents(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<AgentListQuery>,
) -> Result<Json<AgentListing>, AppError> {
    let workspace_id = match query.workspace_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<Uuid>()
                .map_err(|_| AppError::Validation(format!("Invalid workspace_id: {raw}")))?,
        ),
    };

    let listing = state
        .agent_service
        .list_agents(user.as_ref().map(|u| u.user_id.as_str()), workspace_id)
        .await?;
    Ok(Json(listing))
}
