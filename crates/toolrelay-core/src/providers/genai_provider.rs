//! GenaiProvider - hosted models through the genai crate
//!
//! Handles all genai-supported providers (OpenAI, Anthropic, Gemini, etc.)
//! as well as OpenAI-compatible providers (Azure, OpenRouter, Mistral) via
//! the ServiceTargetResolver.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use genai::chat::{ChatRequest, ChatStreamEvent};

use crate::logging::Logger;
use crate::secrets::SecretStore;
use crate::types::{CancellationToken, ChatMessage, ToolCall};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_tool_call, is_genai_supported, to_genai_messages, to_genai_options,
    to_genai_tools, ProviderConfig,
};
use super::traits::{Completion, CompletionOptions, Provider, ProviderModelConfig};

/// Provider backed by genai for all supported LLM APIs
pub struct GenaiProvider {
    /// Provider identifier
    provider_id: String,
    /// Where API keys come from
    secrets: Arc<dyn SecretStore>,
    /// Logger for debug output
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    /// Create a new GenaiProvider
    pub fn new(provider_id: impl Into<String>, secrets: Arc<dyn SecretStore>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider_id: provider_id.into(),
            secrets,
            logger,
        }
    }

    /// Check if this provider can handle the given provider ID
    pub fn supports(provider_id: &str) -> bool {
        is_genai_supported(provider_id)
    }

    /// Extract model name from a model string (e.g., "openai/gpt-4" -> "gpt-4")
    pub fn extract_model_name(model: &str) -> &str {
        model.split('/').nth(1).unwrap_or(model)
    }

    fn requires_api_key(&self) -> bool {
        !matches!(self.provider_id.as_str(), "ollama")
    }

    fn map_error(&self, message: String) -> ProviderError {
        if message.contains("429") || message.to_lowercase().contains("rate limit") {
            ProviderError::RateLimited {
                provider: self.provider_id.clone(),
                message,
            }
        } else {
            ProviderError::api_error(self.provider_id.clone(), 500, message)
        }
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    fn default_api_base(&self) -> &str {
        match self.provider_id.as_str() {
            "openai" => "https://api.openai.com/v1/",
            "anthropic" => "https://api.anthropic.com/",
            "gemini" => "https://generativelanguage.googleapis.com/",
            "ollama" => "http://localhost:11434/",
            "groq" => "https://api.groq.com/openai/v1/",
            "xai" => "https://api.x.ai/v1/",
            "deepseek" => "https://api.deepseek.com/",
            "openrouter" => "https://openrouter.ai/api/v1/",
            "mistral" => "https://api.mistral.ai/v1/",
            _ => "https://api.openai.com/v1/",
        }
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model_config: ProviderModelConfig,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<Completion> {
        self.logger.info(&format!(
            "[GenaiProvider] complete called: provider={}, model={}",
            self.provider_id, model_config.model
        ));

        if self.requires_api_key()
            && model_config.api_key.is_none()
            && !self.secrets.has(&self.provider_id)
        {
            return Err(ProviderError::MissingApiKey {
                provider: self.provider_id.clone(),
            });
        }

        let config = ProviderConfig {
            provider: self.provider_id.clone(),
            api_key: model_config.api_key.clone(),
            api_base: model_config.api_base.clone(),
        };
        let client = create_client(&config, Arc::clone(&self.secrets));

        let mut chat_req = ChatRequest::new(to_genai_messages(messages)?);
        if options.offers_tools() {
            chat_req = chat_req.with_tools(to_genai_tools(options.tools.clone()));
        }
        let genai_options = to_genai_options(&options);
        let model_name = Self::extract_model_name(&model_config.model);

        let chat_stream = client
            .exec_chat_stream(model_name, chat_req, Some(&genai_options))
            .await
            .map_err(|e| self.map_error(e.to_string()))?;
        let mut stream = Box::pin(chat_stream.stream);

        let mut text = String::new();
        let mut calls = Vec::new();

        loop {
            let event = match cancel_token.run_until_cancelled(stream.next()).await {
                None => {
                    self.logger.info("[GenaiProvider] Request cancelled");
                    return Err(ProviderError::Cancelled);
                }
                Some(None) => break,
                Some(Some(Err(e))) => {
                    self.logger.error(&format!("[GenaiProvider] Stream error: {}", e));
                    return Err(self.map_error(e.to_string()));
                }
                Some(Some(Ok(event))) => event,
            };

            match event {
                ChatStreamEvent::Chunk(chunk) => text.push_str(&chunk.content),
                ChatStreamEvent::End(end) => {
                    if let Some(tool_calls) = end.captured_tool_calls() {
                        calls.extend(tool_calls.iter().map(|tc| from_genai_tool_call(tc)));
                    }
                    break;
                }
                _ => {}
            }
        }

        self.logger.debug(&format!(
            "[GenaiProvider] Response: {} chars, {} tool calls",
            text.len(),
            calls.len()
        ));

        self.finish_completion(text, calls, &options)
    }
}

impl GenaiProvider {
    /// Package streamed output, enforcing `ToolChoice::Required`
    ///
    /// genai has no tool choice option, so a forced tool call is checked here.
    fn finish_completion(
        &self,
        text: String,
        calls: Vec<ToolCall>,
        options: &CompletionOptions,
    ) -> ProviderResult<Completion> {
        if !calls.is_empty() {
            let text = if text.is_empty() { None } else { Some(text) };
            return Ok(Completion::ToolCalls { text, calls });
        }
        if options.requires_tool_call() {
            return Err(ProviderError::invalid_response(
                self.provider_id.clone(),
                "a tool call was required but the model answered directly",
            ));
        }
        Ok(Completion::Answer(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;

    fn provider(id: &str) -> GenaiProvider {
        GenaiProvider::new(id, Arc::new(MemorySecretStore::new()), NoOpLogger::shared())
    }

    #[test]
    fn test_extract_model_name() {
        assert_eq!(GenaiProvider::extract_model_name("openai/gpt-4.1-nano"), "gpt-4.1-nano");
        assert_eq!(GenaiProvider::extract_model_name("gpt-4.1-nano"), "gpt-4.1-nano");
    }

    #[test]
    fn test_supports() {
        assert!(GenaiProvider::supports("openai"));
        assert!(GenaiProvider::supports("azure"));
        assert!(!GenaiProvider::supports("unknown_provider"));
    }

    #[test]
    fn test_error_mapping() {
        let p = provider("openai");
        assert!(matches!(
            p.map_error("HTTP 429 Too Many Requests".to_string()),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            p.map_error("connection refused".to_string()),
            ProviderError::ApiError { status: 500, .. }
        ));
    }

    #[test]
    fn test_required_tool_choice_rejects_direct_answer() {
        let p = provider("openai");
        let tools = vec![crate::types::Tool::new("getWeather", "Get the current weather")];
        let required = CompletionOptions::default()
            .with_tools(tools.clone())
            .with_tool_choice(crate::types::ToolChoice::Required);

        assert!(matches!(
            p.finish_completion("It is sunny".to_string(), vec![], &required),
            Err(ProviderError::InvalidResponse { .. })
        ));

        let call = ToolCall::new("c1", "getWeather", serde_json::json!({"location": "Los Angeles, CA"}));
        assert!(matches!(
            p.finish_completion(String::new(), vec![call], &required),
            Ok(Completion::ToolCalls { text: None, .. })
        ));

        let auto = CompletionOptions::default().with_tools(tools);
        assert_eq!(
            p.finish_completion("It is sunny".to_string(), vec![], &auto).unwrap(),
            Completion::Answer("It is sunny".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let p = provider("openai");
        let err = p
            .complete(
                vec![ChatMessage::user("hi")],
                ProviderModelConfig::new("gpt-4.1-nano"),
                CompletionOptions::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey { .. }));
        assert_eq!(p.get_api_base(&ProviderModelConfig::new("x")), "https://api.openai.com/v1/");
    }
}
