//! Read-only catalogs: models and built-in tools.

use axum::Json;
use axum::extract::State;
use serde_json::json;

use parley_core::tools::catalog::BUILTIN_TOOLS;

use crate::state::AppState;

/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "models": state.models.list() }))
}

/// GET /api/tools
pub async fn list_tools() -> Json<serde_json::Value> {
    Json(json!({ "tools": BUILTIN_TOOLS }))
}
