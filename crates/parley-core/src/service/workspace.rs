//! Workspace management service.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use parley_types::error::WorkspaceError;
use parley_types::workspace::Workspace;

use crate::repository::workspace::WorkspaceRepository;

pub struct WorkspaceService<W: WorkspaceRepository> {
    repo: Arc<W>,
}

impl<W: WorkspaceRepository> WorkspaceService<W> {
    pub fn new(repo: Arc<W>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Workspace>, WorkspaceError> {
        Ok(self.repo.list_by_creator(user_id).await?)
    }

    pub async fn create(&self, user_id: &str, name: &str) -> Result<Workspace, WorkspaceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkspaceError::Validation(
                "Workspace name is required".to_string(),
            ));
        }

        let workspace = Workspace {
            id: Uuid::now_v7(),
            name: name.to_string(),
            creator_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        let created = self.repo.create(&workspace).await?;
        info!(workspace_id = %created.id, user_id, "workspace created");
        Ok(created)
    }

    /// Delete a workspace the user owns.
    pub async fn delete(&self, user_id: &str, id: &Uuid) -> Result<(), WorkspaceError> {
        let workspace = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(WorkspaceError::NotFound)?;
        if workspace.creator_id != user_id {
            return Err(WorkspaceError::Forbidden);
        }
        self.repo.delete(id).await?;
        info!(workspace_id = %id, user_id, "workspace deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryWorkspaceRepository;

    fn service() -> WorkspaceService<InMemoryWorkspaceRepository> {
        WorkspaceService::new(Arc::new(InMemoryWorkspaceRepository::default()))
    }

    #[tokio::test]
    async fn test_create_and_list_own_workspaces() {
        let svc = service();
        svc.create("alice", "  Research ").await.unwrap();
        svc.create("alice", "Personal").await.unwrap();
        svc.create("bob", "Other").await.unwrap();

        let names: Vec<String> = svc
            .list("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["Research", "Personal"]);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        assert!(matches!(
            service().create("alice", "   ").await,
            Err(WorkspaceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_requires_ownership() {
        let svc = service();
        let ws = svc.create("alice", "Research").await.unwrap();

        assert!(matches!(
            svc.delete("bob", &ws.id).await,
            Err(WorkspaceError::Forbidden)
        ));
        svc.delete("alice", &ws.id).await.unwrap();
        assert!(matches!(
            svc.delete("alice", &ws.id).await,
            Err(WorkspaceError::NotFound)
        ));
    }
}
