//! Workspace endpoints. All require authentication.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use parley_types::error::WorkspaceError;
use parley_types::workspace::{CreateWorkspaceRequest, Workspace};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::state::AppState;

/// GET /api/workspaces
pub async fn list_workspaces(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Workspace>>, AppError> {
    let workspaces = state.workspace_service.list(&user.user_id).await?;
    Ok(Json(workspaces))
}

/// POST /api/workspaces
pub async fn create_workspace(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateWorkspaceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Workspace>), AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let name = request.name.unwrap_or_default();
    let workspace = state
        .workspace_service
        .create(&user.user_id, &name)
        .await?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

/// DELETE /api/workspaces/{id}
pub async fn delete_workspace(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    // An unparsable id cannot name an existing workspace.
    let id = id.parse::<Uuid>().map_err(|_| WorkspaceError::NotFound)?;
    state.workspace_service.delete(&user.user_id, &id).await?;
    Ok(Json(json!({ "success": true })))
}
