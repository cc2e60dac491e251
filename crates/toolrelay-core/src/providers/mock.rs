//! Mock provider for testing
//!
//! Provides deterministic, configurable responses without network
//! dependencies. The scripted mode plays back a queue of answers, tool-call
//! requests and failures, one per `complete` call, and every request is
//! recorded for later inspection.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{Completion, CompletionOptions, Provider, ProviderModelConfig};
use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, MessageRole, ToolCall};

/// Computes a completion from the conversation it receives
pub type Responder = Arc<dyn Fn(&[ChatMessage]) -> Completion + Send + Sync>;

/// One scripted provider reply
#[derive(Clone)]
pub enum MockStep {
    /// Return a final answer
    Answer(String),
    /// Request tool execution
    ToolCalls {
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
    /// Fail the call
    Fail(String),
    /// Compute the reply from the conversation
    Respond(Responder),
}

impl MockStep {
    pub fn answer(text: impl Into<String>) -> Self {
        MockStep::Answer(text.into())
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        MockStep::ToolCalls { text: None, calls }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        MockStep::Fail(message.into())
    }

    pub fn respond<F>(func: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Completion + Send + Sync + 'static,
    {
        MockStep::Respond(Arc::new(func))
    }
}

impl std::fmt::Debug for MockStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MockStep::Answer(text) => f.debug_tuple("Answer").field(text).finish(),
            MockStep::ToolCalls { text, calls } => f
                .debug_struct("ToolCalls")
                .field("text", text)
                .field("calls", calls)
                .finish(),
            MockStep::Fail(message) => f.debug_tuple("Fail").field(message).finish(),
            MockStep::Respond(_) => f.write_str("Respond(..)"),
        }
    }
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Always return the same answer
    Fixed(String),
    /// Play back steps in order; running out is an error
    Script(Vec<MockStep>),
    /// Always fail
    Error(String),
}

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub model: ProviderModelConfig,
    pub options: CompletionOptions,
}

/// Mock LLM provider for testing
pub struct MockProvider {
    mode: MockMode,
    script: Mutex<VecDeque<MockStep>>,
    requests: Mutex<Vec<RecordedRequest>>,
    /// Delay before each reply in milliseconds (0 = no delay)
    delay_ms: u64,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create with a specific mode
    pub fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        let script = match &mode {
            MockMode::Script(steps) => steps.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            mode,
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            delay_ms: 0,
            logger,
        }
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Create a scripted provider
    pub fn scripted(steps: Vec<MockStep>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Script(steps), logger)
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Error(message.into()), logger)
    }

    /// Set reply delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Number of `complete` calls received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Steps not yet played back
    pub fn remaining_steps(&self) -> usize {
        self.script.lock().len()
    }

    /// Extract last user message content
    fn last_user_message(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::User)
            .map(ChatMessage::flattened_text)
            .find(|t| !t.is_empty())
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }

    fn next_step(&self, messages: &[ChatMessage]) -> ProviderResult<Completion> {
        match &self.mode {
            MockMode::Echo => Ok(Completion::Answer(format!(
                "Echo: {}",
                Self::last_user_message(messages)
            ))),
            MockMode::Fixed(response) => Ok(Completion::Answer(response.clone())),
            MockMode::Error(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
            MockMode::Script(_) => {
                let step = self
                    .script
                    .lock()
                    .pop_front()
                    .ok_or_else(|| ProviderError::Other("Mock script exhausted".to_string()))?;
                self.logger.debug(&format!("MockProvider: playing {:?}", step));
                match step {
                    MockStep::Answer(text) => Ok(Completion::Answer(text)),
                    MockStep::ToolCalls { text, calls } => Ok(Completion::ToolCalls { text, calls }),
                    MockStep::Fail(message) => Err(ProviderError::api_error("mock", 503, message)),
                    MockStep::Respond(func) => Ok(func(messages)),
                }
            }
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_api_base(&self) -> &str {
        "http://localhost:0/mock"
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<Completion> {
        self.logger.debug(&format!(
            "MockProvider: complete called with {} messages, {} tools",
            messages.len(),
            options.tools.len()
        ));

        self.requests.lock().push(RecordedRequest {
            messages: messages.clone(),
            model,
            options,
        });

        if self.delay_ms > 0 {
            let sleep = tokio::time::sleep(Duration::from_millis(self.delay_ms));
            if cancel_token.run_until_cancelled(sleep).await.is_none() {
                return Err(ProviderError::Cancelled);
            }
        } else if cancel_token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        self.next_step(&messages)
    }
}
