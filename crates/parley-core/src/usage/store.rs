//! UsageStore trait definition.

use chrono::NaiveDate;

use parley_types::error::RepositoryError;
use parley_types::usage::{UsageCounter, UsageRecord};

/// Keyed daily counter store.
///
/// Implementations live in parley-infra (e.g., `SqliteUsageStore`).
pub trait UsageStore: Send + Sync {
    /// Atomically increment `counter` for `(user_id, day)` if its current
    /// value is below `limit`.
    ///
    /// Returns the new value, or `None` when the counter was already at or
    /// above `limit` (nothing is written). A missing row counts as zero.
    fn increment_if_below(
        &self,
        user_id: &str,
        day: NaiveDate,
        counter: UsageCounter,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Option<u32>, RepositoryError>> + Send;

    /// Current counters for `(user_id, day)`.
    fn get(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Option<UsageRecord>, RepositoryError>> + Send;
}
