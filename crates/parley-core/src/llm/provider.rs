//! LlmProvider trait definition.
//!
//! The one abstraction every model backend implements. Turns only ever
//! stream, so the trait is a single object-safe `stream` method.

use std::pin::Pin;

use futures_util::Stream;

use parley_types::llm::{CompletionRequest, LlmError, StreamEvent};

/// A boxed stream of provider events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for model provider backends.
///
/// Implementations live in parley-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "google").
    fn name(&self) -> &str;

    /// Send a streaming completion request. Returns a stream of events.
    ///
    /// The stream is `'static` so it can outlive the borrow of the provider
    /// and be driven from the response body.
    fn stream(&self, request: CompletionRequest) -> EventStream;
}
