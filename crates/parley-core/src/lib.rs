//! Business logic and port definitions for Parley.
//!
//! This crate defines the "ports" (repository, store and tool-loader
//! traits) that the infrastructure layer implements, and the chat-turn
//! orchestration built on them. It depends only on `parley-types`, never
//! on `parley-infra` or any database/IO crate.

pub mod app_info;
pub mod chat;
pub mod llm;
pub mod repository;
pub mod service;
pub mod tools;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;
