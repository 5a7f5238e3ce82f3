//! App info store trait.
//!
//! Process-wide key-value settings (e.g. the app's author).
//! Implementations live in parley-infra.

use parley_types::error::RepositoryError;

/// Key holding the name returned to author questions.
pub const AUTHOR_KEY: &str = "author";

/// Returned in place of the author when none is configured.
pub const AUTHOR_PLACEHOLDER: &str = "Auteur non disponible.";

pub trait AppInfoStore: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Insert or replace the value for `key`.
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
