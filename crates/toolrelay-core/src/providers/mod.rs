//! LLM providers
//!
//! A provider turns a conversation plus a tool catalog into either a final
//! answer or a batch of tool-call requests ([`Completion`]).
//!
//! ## Architecture
//!
//! Hosted providers all go through the `genai` crate, which handles:
//! - Streaming and provider-specific protocols (OpenAI, Anthropic, Gemini, etc.)
//! - Native tool calling
//! - JSON-schema response formats
//!
//! Providers not native to genai (Azure, OpenRouter, Mistral) are routed via
//! genai's `ServiceTargetResolver` using the OpenAI-compatible protocol.
//! Auth flows through a [`SecretStore`], not genai's env var lookup.
//!
//! `MockProvider` drives tests and examples; `InspectingProvider` wraps any
//! provider and logs what it is sent.

mod traits;
mod error;
mod genai_adapter;
mod genai_provider;
mod inspect;
mod mock;

pub use traits::{Completion, CompletionOptions, Provider, ProviderModelConfig};
pub use error::{ProviderError, ProviderResult};

pub use genai_provider::GenaiProvider;
pub use genai_adapter::{is_genai_native, is_genai_supported, ProviderConfig};

pub use inspect::{InspectingProvider, DEFAULT_INSPECT_CHARS};
pub use mock::{MockMode, MockProvider, MockStep, RecordedRequest, Responder};

use crate::logging::Logger;
use crate::secrets::SecretStore;
use std::sync::Arc;

/// Create a provider for the given provider ID
///
/// `mock` yields an echoing `MockProvider`. Anything else goes to
/// `GenaiProvider`; unknown ids are treated as OpenAI-compatible endpoints.
pub fn create_provider(
    provider_id: &str,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
) -> Arc<dyn Provider> {
    let id = provider_id.to_lowercase();
    match id.as_str() {
        "mock" => Arc::new(MockProvider::echo(logger)),
        _ => {
            if !GenaiProvider::supports(&id) {
                logger.warn(&format!(
                    "[Providers] Unknown provider '{}', treating it as OpenAI-compatible",
                    provider_id
                ));
            }
            Arc::new(GenaiProvider::new(id, secrets, logger))
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
        // Testing
        "mock",
    ]
}
