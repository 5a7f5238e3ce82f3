//! Model descriptors exposed by the model registry.

use serde::{Deserialize, Serialize};

/// Static description of a model the server can route turns to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub id: String,
    pub name: String,
    /// Display name of the vendor (e.g. "Google").
    pub provider: String,
    /// Key of the provider backend that serves this model (e.g. "google").
    pub provider_id: String,
    pub context_window: u32,
    pub tools: bool,
    pub vision: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
