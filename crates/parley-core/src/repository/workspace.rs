//! Workspace repository trait definition.

use parley_types::error::RepositoryError;
use parley_types::workspace::Workspace;
use uuid::Uuid;

/// Repository trait for workspace persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteWorkspaceRepository`).
pub trait WorkspaceRepository: Send + Sync {
    fn create(
        &self,
        workspace: &Workspace,
    ) -> impl std::future::Future<Output = Result<Workspace, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Workspace>, RepositoryError>> + Send;

    /// A creator's workspaces, oldest first.
    fn list_by_creator(
        &self,
        creator_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Workspace>, RepositoryError>> + Send;

    /// Delete a workspace. Agents filed under it become unassigned.
    fn delete(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
