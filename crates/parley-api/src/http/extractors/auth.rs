//! API token authentication extractors.
//!
//! Tokens are read from:
//! - `Authorization: Bearer <token>` header
//! - `X-API-Key: <token>` header
//!
//! Tokens are SHA-256 hashed and looked up in the `api_tokens` table, which
//! maps each token to the user it was issued for.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::Row;

use crate::http::error::AppError;
use crate::state::AppState;

/// Prefix of every issued token.
pub const TOKEN_PREFIX: &str = "prl_";

/// The user behind a valid API token. Extracting this requires one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Optional authentication: `None` without a token, 401 for an invalid one.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?.ok_or_else(|| {
            AppError::Unauthorized(
                "Missing API token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
            )
        })?;
        verify_token(state, &token).await
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match extract_token(parts)? {
            Some(token) => Ok(MaybeUser(Some(verify_token(state, &token).await?))),
            None => Ok(MaybeUser(None)),
        }
    }
}

async fn verify_token(state: &AppState, token: &str) -> Result<AuthenticatedUser, AppError> {
    let token_hash = hash_token(token);
    let row = sqlx::query("SELECT id, user_id FROM api_tokens WHERE token_hash = ?")
        .bind(&token_hash)
        .fetch_optional(&state.db_pool.reader)
        .await
        .map_err(|e| AppError::Internal(format!("Database error: {e}")))?;

    let Some(row) = row else {
        return Err(AppError::Unauthorized("Invalid API token.".to_string()));
    };

    // Best effort; a failed timestamp update does not fail the request.
    let id: String = row.get("id");
    let now = chrono::Utc::now().to_rfc3339();
    let _ = sqlx::query("UPDATE api_tokens SET last_used_at = ? WHERE id = ?")
        .bind(&now)
        .bind(&id)
        .execute(&state.db_pool.writer)
        .await;

    Ok(AuthenticatedUser {
        user_id: row.get("user_id"),
    })
}

/// Read the token from request headers, if one was sent.
fn extract_token(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(Some(token.trim().to_string()).filter(|t| !t.is_empty()));
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(Some(key_str.trim().to_string()).filter(|t| !t.is_empty()));
    }

    Ok(None)
}

/// SHA-256 of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// Issue a new token for `user_id` and store its hash.
///
/// Returns the plaintext token; it is not recoverable afterwards.
pub async fn issue_token(state: &AppState, user_id: &str) -> anyhow::Result<String> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = format!(
        "{TOKEN_PREFIX}{}",
        bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    );

    sqlx::query(
        "INSERT INTO api_tokens (id, user_id, token_hash, token_prefix, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::now_v7().to_string())
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(&token[..TOKEN_PREFIX.len() + 8])
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db_pool.writer)
    .await?;

    tracing::info!(user_id, "api token issued");
    Ok(token)
}
