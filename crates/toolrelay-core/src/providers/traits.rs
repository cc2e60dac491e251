//! Provider trait definition

use async_trait::async_trait;

use crate::structured::Schema;
use crate::types::{CancellationToken, ChatMessage, Tool, ToolCall, ToolChoice};
use super::error::ProviderResult;

/// Model configuration for provider requests
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderModelConfig {
    /// Model identifier as used by the provider's API
    pub model: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    /// Create a new model config
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Options for a completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools available for the model to use
    pub tools: Vec<Tool>,
    /// Tool choice behavior
    pub tool_choice: Option<ToolChoice>,
    /// Shape the final answer must conform to
    pub output_schema: Option<Schema>,
}

impl CompletionOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    /// Set tool choice
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Request a structured answer
    pub fn with_output_schema(mut self, schema: Schema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Whether tools should be offered to the model
    pub fn offers_tools(&self) -> bool {
        !self.tools.is_empty() && self.tool_choice != Some(ToolChoice::None)
    }

    /// Whether an answer without tool calls breaks the request
    pub fn requires_tool_call(&self) -> bool {
        !self.tools.is_empty() && self.tool_choice == Some(ToolChoice::Required)
    }
}

/// What the provider answered
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// A final answer
    Answer(String),
    /// A request to execute tools before answering
    ToolCalls {
        /// Text the model emitted alongside the calls, if any
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
}

impl Completion {
    /// Tool calls requesting execution, empty for an answer
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Completion::Answer(_) => &[],
            Completion::ToolCalls { calls, .. } => calls,
        }
    }
}

/// Provider trait for LLM implementations
///
/// Any implementation honouring `complete` is substitutable in the
/// coordinator.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// Get the default API base URL
    fn default_api_base(&self) -> &str;

    /// Complete a conversation, possibly requesting tool calls
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<Completion>;

    /// Count tokens for text (approximate: ~4 characters per token)
    async fn count_tokens(&self, text: &str) -> ProviderResult<usize> {
        Ok(text.len() / 4)
    }

    /// Get the API base URL, using custom if provided
    fn get_api_base(&self, model: &ProviderModelConfig) -> String {
        model.api_base.clone().unwrap_or_else(|| self.default_api_base().to_string())
    }
}
