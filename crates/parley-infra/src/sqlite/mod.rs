//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod agent;
pub mod app_info;
pub mod message;
pub mod pool;
pub mod usage;
pub mod workspace;
