//! BoxLlmProvider -- shared, type-erased handle to an LlmProvider.

use std::fmt;
use std::sync::Arc;

use parley_types::llm::CompletionRequest;

use super::provider::{EventStream, LlmProvider};

/// Type-erased model provider for runtime selection.
///
/// Cheap to clone; every clone talks to the same underlying provider.
#[derive(Clone)]
pub struct BoxLlmProvider {
    inner: Arc<dyn LlmProvider>,
}

impl BoxLlmProvider {
    /// Wrap a concrete `LlmProvider`.
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send a streaming completion request.
    pub fn stream(&self, request: CompletionRequest) -> EventStream {
        self.inner.stream(request)
    }
}

impl fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("name", &self.name())
            .finish()
    }
}
