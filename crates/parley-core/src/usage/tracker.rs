//! Usage tracker: the daily quota gate in front of every model call.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use parley_types::config::UsageLimits;
use parley_types::error::ChatError;
use parley_types::usage::{UsageCounter, UsageTicket};

use super::store::UsageStore;

pub struct UsageTracker<U: UsageStore> {
    store: Arc<U>,
    limits: UsageLimits,
}

impl<U: UsageStore> UsageTracker<U> {
    pub fn new(store: Arc<U>, limits: UsageLimits) -> Self {
        Self { store, limits }
    }

    /// Count one turn against the user's daily message quota.
    ///
    /// Fails with `DailyLimitExceeded`, writing nothing, when the counter
    /// has already reached the plan's limit.
    pub async fn check_and_track(
        &self,
        user_id: &str,
        model_id: &str,
        is_authenticated: bool,
    ) -> Result<UsageTicket, ChatError> {
        let limit = self.limits.message_limit(is_authenticated);
        let ticket = self
            .increment(user_id, UsageCounter::Messages, limit)
            .await?
            .ok_or(ChatError::DailyLimitExceeded { limit })?;

        debug!(
            user_id,
            model = model_id,
            count = ticket.count,
            limit,
            "usage tracked"
        );
        Ok(ticket)
    }

    /// Count one turn against the user's special-agent quota.
    pub async fn track_special_agent_usage(&self, user_id: &str) -> Result<UsageTicket, ChatError> {
        let limit = self.limits.daily_special_agent_limit;
        self.increment(user_id, UsageCounter::SpecialAgent, limit)
            .await?
            .ok_or(ChatError::SpecialAgentLimitExceeded { limit })
    }

    async fn increment(
        &self,
        user_id: &str,
        counter: UsageCounter,
        limit: u32,
    ) -> Result<Option<UsageTicket>, ChatError> {
        let day = Utc::now().date_naive();
        if limit == 0 {
            warn!(user_id, %counter, "usage limit is zero, rejecting");
            return Ok(None);
        }

        let count = self
            .store
            .increment_if_below(user_id, day, counter, limit)
            .await?;

        Ok(count.map(|count| UsageTicket {
            user_id: user_id.to_string(),
            day,
            count,
            limit,
        }))
    }
}
