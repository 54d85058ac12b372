//! LLM Provider implementations
//!
//! ## Architecture
//!
//! All real providers go through the `genai` crate, which handles the
//! provider-specific protocols, streaming and tool calling. Providers not
//! native to genai (Azure, OpenRouter, Mistral, Red Hat AI, any other
//! OpenAI-compatible endpoint) are routed with genai's
//! `ServiceTargetResolver`.
//!
//! The `MockProvider` is kept for testing purposes.

mod error;
mod genai_adapter;
mod genai_provider;
mod mock;
mod traits;

pub use error::{ProviderError, ProviderResult};
pub use genai_adapter::{is_genai_native, is_genai_supported, ProviderConfig};
pub use genai_provider::GenaiProvider;
pub use mock::{MockConfig, MockMode, MockProvider, MockRequest};
pub use traits::{ChatOptions, Provider, ProviderModelConfig};

use crate::logging::Logger;
use std::sync::Arc;

/// Create a provider for the given provider ID
///
/// `mock` gives an echoing `MockProvider`; every other id goes to
/// `GenaiProvider`, which treats unknown ids as native genai adapters.
pub fn create_provider(provider_id: &str, logger: Arc<dyn Logger>) -> Arc<dyn Provider> {
    match provider_id.to_lowercase().as_str() {
        "mock" => Arc::new(MockProvider::echo(logger)),
        _ => {
            if !GenaiProvider::supports(provider_id) {
                logger.warn(&format!(
                    "[Providers] Unknown provider '{}' (known: {}), letting genai resolve it from the model name",
                    provider_id,
                    supported_providers().join(", ")
                ));
            }
            Arc::new(GenaiProvider::new(provider_id, logger))
        }
    }
}

/// List all supported provider IDs
pub fn supported_providers() -> Vec<&'static str> {
    vec![
        // Native genai providers
        "openai",
        "anthropic",
        "gemini",
        "ollama",
        "groq",
        "xai",
        "deepseek",
        "cohere",
        "fireworks",
        "together",
        // OpenAI-compatible providers via resolver
        "azure",
        "openrouter",
        "mistral",
        "redhat",
        "openai-compatible",
        // Testing
        "mock",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};

    #[test]
    fn test_create_provider() {
        assert_eq!(create_provider("mock", NoOpLogger::shared()).name(), "mock");
        assert_eq!(create_provider("ollama", NoOpLogger::shared()).name(), "ollama");
        assert!(supported_providers()
            .iter()
            .all(|p| *p == "mock" || GenaiProvider::supports(p)));
    }

    #[test]
    fn test_unknown_provider_lists_known_ids() {
        let logger = Arc::new(MemoryLogger::new());
        let provider = create_provider("acme", logger.clone());
        assert_eq!(provider.name(), "acme");
        assert!(logger.contains(LogLevel::Warn, "Unknown provider 'acme'"));
        assert!(logger.contains(LogLevel::Warn, "openrouter"));
    }
}
