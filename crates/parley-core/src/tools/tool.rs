//! Tool trait and its type-erased handle.
//!
//! Same blanket-impl shape as the provider wrapper:
//! 1. `Tool` uses RPITIT for `call`
//! 2. object-safe `ToolDyn` boxes the future, blanket-implemented for all `T: Tool`
//! 3. `BoxTool` holds an `Arc<dyn ToolDyn>` and delegates

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parley_types::error::ToolError;
use parley_types::llm::ToolDefinition;

/// A capability the model can invoke with JSON arguments.
pub trait Tool: Send + Sync {
    /// Name, description and input schema advertised to the model.
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool. The returned value is sent back to the model.
    fn call(
        &self,
        arguments: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, ToolError>> + Send;
}

/// Object-safe version of [`Tool`] with a boxed future.
pub trait ToolDyn: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    fn call_boxed(
        &self,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send + '_>>;
}

impl<T: Tool> ToolDyn for T {
    fn definition(&self) -> &ToolDefinition {
        Tool::definition(self)
    }

    fn call_boxed(
        &self,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send + '_>> {
        Box::pin(self.call(arguments))
    }
}

/// Shared, type-erased tool handle.
#[derive(Clone)]
pub struct BoxTool {
    inner: Arc<dyn ToolDyn>,
}

impl BoxTool {
    pub fn new<T: Tool + 'static>(tool: T) -> Self {
        Self {
            inner: Arc::new(tool),
        }
    }

    pub fn definition(&self) -> &ToolDefinition {
        self.inner.definition()
    }

    pub fn name(&self) -> &str {
        &self.inner.definition().name
    }

    pub async fn call(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        self.inner.call_boxed(arguments).await
    }
}

impl fmt::Debug for BoxTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxTool").field("name", &self.name()).finish()
    }
}
