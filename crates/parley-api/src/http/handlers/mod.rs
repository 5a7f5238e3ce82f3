//! HTTP request handlers, one module per resource.

pub mod agents;
pub mod catalog;
pub mod chat;
pub mod workspaces;
