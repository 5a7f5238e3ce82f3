//! Daily usage gate.

pub mod store;
pub mod tracker;

pub use store::UsageStore;
pub use tracker::UsageTracker;
