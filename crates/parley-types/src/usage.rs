//! Per-user daily usage counters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which daily counter an increment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCounter {
    Messages,
    SpecialAgent,
}

impl fmt::Display for UsageCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageCounter::Messages => write!(f, "messages"),
            UsageCounter::SpecialAgent => write!(f, "special_agent"),
        }
    }
}

/// Counters for one user on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub day: NaiveDate,
    pub message_count: u32,
    pub special_agent_count: u32,
}

impl UsageRecord {
    pub fn count(&self, counter: UsageCounter) -> u32 {
        match counter {
            UsageCounter::Messages => self.message_count,
            UsageCounter::SpecialAgent => self.special_agent_count,
        }
    }
}

/// Proof that a turn passed the usage gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTicket {
    pub user_id: String,
    pub day: NaiveDate,
    /// Counter value after this turn's increment.
    pub count: u32,
    pub limit: u32,
}

impl UsageTicket {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}
