//! Model Context Protocol client for remote tool servers.

pub mod client;
pub mod loader;

pub use client::McpClient;
pub use loader::McpToolLoader;
