//! Infrastructure layer for Parley.
//!
//! Implements the ports defined in `parley-core`: SQLite storage, the
//! OpenAI-compatible model provider, the MCP tool loader and built-in tools,
//! plus data directory and configuration loading.

pub mod config;
pub mod llm;
pub mod mcp;
pub mod sqlite;
pub mod tools;
