//! Model provider abstractions for Parley.
//!
//! - `LlmProvider`: trait for concrete provider implementations
//! - `BoxLlmProvider`: shared handle for dynamic dispatch
//! - `ModelRegistry`: read-only catalog of models and their provider factories

pub mod box_provider;
pub mod provider;
pub mod registry;

pub use box_provider::BoxLlmProvider;
pub use provider::{EventStream, LlmProvider};
pub use registry::{ModelEntry, ModelRegistry, ProviderFactory};
