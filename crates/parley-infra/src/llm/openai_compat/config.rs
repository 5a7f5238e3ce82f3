//! Configuration for OpenAI-compatible providers.
//!
//! Each backend that speaks the OpenAI chat completions protocol gets a
//! factory function returning an [`OpenAiCompatConfig`] with the correct base
//! URL and provider name.

use secrecy::SecretString;

/// Configuration for an OpenAI-compatible provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Provider key (e.g., "google").
    pub provider_name: String,
    /// Base URL for the API, without the `/chat/completions` suffix.
    pub base_url: String,
    pub api_key: SecretString,
}

/// Google Gemini over its OpenAI-compatible endpoint.
pub fn gemini_defaults(base_url: &str, api_key: SecretString) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "google".into(),
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_defaults_trim_trailing_slash() {
        let config = gemini_defaults(
            "https://generativelanguage.googleapis.com/v1beta/openai/",
            SecretString::from("k"),
        );
        assert_eq!(config.provider_name, "google");
        assert_eq!(
            config.base_url,
            "https://generativelanguage.googleapis.com/v1beta/openai"
        );
    }
}
