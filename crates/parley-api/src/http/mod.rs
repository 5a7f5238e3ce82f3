//! HTTP API layer for Parley.
//!
//! Axum routes under `/api/` with bearer-token authentication for the
//! agent and workspace endpoints and a line-delimited stream for chat.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod stream;

#[cfg(test)]
mod tests;
