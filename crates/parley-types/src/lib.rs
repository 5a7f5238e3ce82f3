//! Shared domain types for Parley.
//!
//! Chat turns and messages, agents and workspaces, model descriptors,
//! usage counters, configuration, and the error types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror and deunicode.

pub mod agent;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod usage;
pub mod workspace;
