//! SQLite daily usage store.
//!
//! Implements `UsageStore` from `parley-core`. Increment-and-check is a single
//! upsert with a guarded `DO UPDATE`, so concurrent turns can never push a
//! counter past its limit.

use chrono::{NaiveDate, Utc};
use parley_core::usage::UsageStore;
use parley_types::error::RepositoryError;
use parley_types::usage::{UsageCounter, UsageRecord};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `UsageStore`.
pub struct SqliteUsageStore {
    pool: DatabasePool,
}

impl SqliteUsageStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const INCREMENT_MESSAGES: &str = r#"
INSERT INTO daily_usage (user_id, day, message_count, special_agent_count, updated_at)
VALUES (?, ?, 1, 0, ?)
ON CONFLICT(user_id, day) DO UPDATE
    SET message_count = daily_usage.message_count + 1,
        updated_at = excluded.updated_at
    WHERE daily_usage.message_count < ?
RETURNING message_count AS count
"#;

const INCREMENT_SPECIAL_AGENT: &str = r#"
INSERT INTO daily_usage (user_id, day, message_count, special_agent_count, updated_at)
VALUES (?, ?, 0, 1, ?)
ON CONFLICT(user_id, day) DO UPDATE
    SET special_agent_count = daily_usage.special_agent_count + 1,
        updated_at = excluded.updated_at
    WHERE daily_usage.special_agent_count < ?
RETURNING special_agent_count AS count
"#;

fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

impl UsageStore for SqliteUsageStore {
    async fn increment_if_below(
        &self,
        user_id: &str,
        day: NaiveDate,
        counter: UsageCounter,
        limit: u32,
    ) -> Result<Option<u32>, RepositoryError> {
        // A fresh row starts at 1, so the insert path must respect the limit too.
        if limit == 0 {
            return Ok(None);
        }

        let sql = match counter {
            UsageCounter::Messages => INCREMENT_MESSAGES,
            UsageCounter::SpecialAgent => INCREMENT_SPECIAL_AGENT,
        };

        let row = sqlx::query(sql)
            .bind(user_id)
            .bind(format_day(day))
            .bind(Utc::now().to_rfc3339())
            .bind(i64::from(limit))
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|row| {
            row.try_get::<i64, _>("count")
                .map(|c| c as u32)
                .map_err(|e| RepositoryError::Query(e.to_string()))
        })
        .transpose()
    }

    async fn get(&self, user_id: &str, day: NaiveDate) -> Result<Option<UsageRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT message_count, special_agent_count FROM daily_usage WHERE user_id = ? AND day = ?",
        )
        .bind(user_id)
        .bind(format_day(day))
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let message_count: i64 = row
            .try_get("message_count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let special_agent_count: i64 = row
            .try_get("special_agent_count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Some(UsageRecord {
            user_id: user_id.to_string(),
            day,
            message_count: message_count as u32,
            special_agent_count: special_agent_count as u32,
        }))
    }
}
