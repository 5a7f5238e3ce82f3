//! MessageRepository trait definition.

use parley_types::chat::StoredMessage;
use parley_types::error::RepositoryError;

/// Repository trait for chat message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteMessageRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait MessageRepository: Send + Sync {
    /// Insert a batch of messages atomically.
    fn save_messages(
        &self,
        messages: &[StoredMessage],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Messages of a chat, oldest first.
    fn list_messages(
        &self,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;
}
