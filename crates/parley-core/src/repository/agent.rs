//! Agent repository trait definition.

use parley_types::agent::Agent;
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Which of a creator's agents to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceScope {
    /// Agents filed under this workspace.
    In(Uuid),
    /// Agents not filed under any workspace.
    Unassigned,
}

/// Repository trait for agent persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteAgentRepository`).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait AgentRepository: Send + Sync {
    /// Create a new agent. A taken slug yields `RepositoryError::Conflict`.
    fn create(
        &self,
        agent: &Agent,
    ) -> impl std::future::Future<Output = Result<Agent, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    fn get_by_slug(
        &self,
        slug: &str,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    /// Agents whose slug is in `slugs`, in the order of `slugs`.
    fn list_by_slugs(
        &self,
        slugs: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Agent>, RepositoryError>> + Send;

    /// A creator's agents within `scope`, newest first.
    fn list_by_creator(
        &self,
        creator_id: &str,
        scope: WorkspaceScope,
    ) -> impl std::future::Future<Output = Result<Vec<Agent>, RepositoryError>> + Send;
}
