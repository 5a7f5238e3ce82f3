//! Model registry for runtime model lookup.
//!
//! Built once at startup and shared read-only. Each entry pairs a
//! `ModelConfig` with a factory that produces a provider handle for it.

use std::fmt;
use std::sync::Arc;

use parley_types::llm::LlmError;
use parley_types::model::ModelConfig;

use super::box_provider::BoxLlmProvider;

/// Builds a provider handle for one model.
pub type ProviderFactory = Arc<dyn Fn() -> Result<BoxLlmProvider, LlmError> + Send + Sync>;

/// A registered model and its provider factory.
#[derive(Clone)]
pub struct ModelEntry {
    pub config: ModelConfig,
    factory: ProviderFactory,
}

impl ModelEntry {
    /// Instantiate the provider that serves this model.
    pub fn create_provider(&self) -> Result<BoxLlmProvider, LlmError> {
        (self.factory)()
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Registry of models, in registration order.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelEntry>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Register a model. An existing entry with the same id is replaced.
    pub fn register(&mut self, config: ModelConfig, factory: ProviderFactory) {
        let entry = ModelEntry { config, factory };
        match self.models.iter_mut().find(|m| m.config.id == entry.config.id) {
            Some(existing) => *existing = entry,
            None => self.models.push(entry),
        }
    }

    /// Look up a model by id.
    pub fn get(&self, model_id: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.config.id == model_id)
    }

    /// All registered model descriptors.
    pub fn list(&self) -> Vec<&ModelConfig> {
        self.models.iter().map(|m| &m.config).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
