//! Model provider implementations and the built-in model registry.
//!
//! [`build_model_registry`] registers every supported model with a factory
//! that constructs its provider on demand. API keys are read from the
//! environment when a provider is created, so a missing key only fails the
//! turns that need it.

pub mod openai_compat;

use std::sync::Arc;

use secrecy::SecretString;

use parley_core::llm::{BoxLlmProvider, ModelRegistry, ProviderFactory};
use parley_types::config::EndpointConfig;
use parley_types::llm::LlmError;
use parley_types::model::ModelConfig;

use self::openai_compat::OpenAiCompatibleProvider;

/// Models served by this build, in display order.
pub fn builtin_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            id: "gemini-2.5-flash-preview-05-20".to_string(),
            name: "Gemini 2.5 Flash Preview".to_string(),
            provider: "Google".to_string(),
            provider_id: "google".to_string(),
            context_window: 128_000,
            tools: true,
            vision: true,
            description: Some("Fast multimodal model with tool use.".to_string()),
        },
        ModelConfig {
            id: "gemini-2.0-flash-001".to_string(),
            name: "Gemini 2.0 Flash".to_string(),
            provider: "Google".to_string(),
            provider_id: "google".to_string(),
            context_window: 30_720,
            tools: true,
            vision: false,
            description: Some("Low-latency text model.".to_string()),
        },
    ]
}

/// Resolve the API key named by `endpoint.api_key_env`.
pub fn resolve_api_key(endpoint: &EndpointConfig) -> Option<SecretString> {
    std::env::var(&endpoint.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .map(SecretString::from)
}

/// Factory for Gemini models over the OpenAI-compatible endpoint.
pub fn gemini_factory(endpoint: EndpointConfig) -> ProviderFactory {
    Arc::new(move || {
        let api_key = resolve_api_key(&endpoint).ok_or_else(|| {
            LlmError::NotConfigured(format!("{} is not set", endpoint.api_key_env))
        })?;
        let provider = OpenAiCompatibleProvider::gemini(&endpoint.base_url, api_key);
        Ok(BoxLlmProvider::new(provider))
    })
}

/// Build the registry of built-in models.
pub fn build_model_registry(google: &EndpointConfig) -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    for model in builtin_models() {
        let factory = match model.provider_id.as_str() {
            "google" => gemini_factory(google.clone()),
            other => {
                tracing::warn!(provider = other, model = %model.id, "no provider backend, skipping model");
                continue;
            }
        };
        registry.register(model, factory);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(env: &str) -> EndpointConfig {
        EndpointConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            api_key_env: env.to_string(),
        }
    }

    #[test]
    fn test_registry_lists_builtin_models() {
        let registry = build_model_registry(&endpoint("PARLEY_TEST_UNUSED_KEY"));
        let ids: Vec<&str> = registry.list().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["gemini-2.5-flash-preview-05-20", "gemini-2.0-flash-001"]);

        let flash = registry.get("gemini-2.5-flash-preview-05-20").unwrap();
        assert!(flash.config.tools);
        assert!(flash.config.vision);
        assert_eq!(flash.config.context_window, 128_000);
    }

    #[test]
    fn test_missing_key_fails_at_provider_creation() {
        let registry = build_model_registry(&endpoint("PARLEY_TEST_DEFINITELY_UNSET_KEY"));
        let err = registry
            .get("gemini-2.0-flash-001")
            .unwrap()
            .create_provider()
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::NotConfigured(ref m) if m.contains("PARLEY_TEST_DEFINITELY_UNSET_KEY")));
    }

    #[test]
    fn test_key_from_environment_builds_provider() {
        // SAFETY: test-only env var with a name no other test reads.
        unsafe { std::env::set_var("PARLEY_TEST_GEMINI_KEY", "k") };
        let registry = build_model_registry(&endpoint("PARLEY_TEST_GEMINI_KEY"));
        let provider = registry
            .get("gemini-2.0-flash-001")
            .unwrap()
            .create_provider()
            .unwrap();
        assert_eq!(provider.name(), "google");
    }
}
