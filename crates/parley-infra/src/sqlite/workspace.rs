//! SQLite workspace repository implementation.

use chrono::{DateTime, Utc};
use parley_core::repository::workspace::WorkspaceRepository;
use parley_types::error::RepositoryError;
use parley_types::workspace::Workspace;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `WorkspaceRepository`.
pub struct SqliteWorkspaceRepository {
    pool: DatabasePool,
}

impl SqliteWorkspaceRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn workspace_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Workspace, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(Workspace {
        id: Uuid::parse_str(&id)
            .map_err(|e| RepositoryError::Query(format!("invalid workspace id: {e}")))?,
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        creator_id: row
            .try_get("creator_id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))?,
    })
}

impl WorkspaceRepository for SqliteWorkspaceRepository {
    async fn create(&self, workspace: &Workspace) -> Result<Workspace, RepositoryError> {
        sqlx::query("INSERT INTO workspaces (id, name, creator_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(workspace.id.to_string())
            .bind(&workspace.name)
            .bind(&workspace.creator_id)
            .bind(workspace.created_at.to_rfc3339())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(workspace.clone())
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Workspace>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM workspaces WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(workspace_from_row).transpose()
    }

    async fn list_by_creator(&self, creator_id: &str) -> Result<Vec<Workspace>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM workspaces WHERE creator_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(creator_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(workspace_from_row).collect()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM workspaces WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
