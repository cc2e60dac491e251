//! Provider wrapper that logs every prompt before forwarding it

use async_trait::async_trait;
use std::sync::Arc;

use super::error::ProviderResult;
use super::traits::{Completion, CompletionOptions, Provider, ProviderModelConfig};
use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage};

/// Default number of characters shown per turn
pub const DEFAULT_INSPECT_CHARS: usize = 300;

/// Wraps a provider and logs the conversation it is sent
///
/// Useful for watching what compaction and tool turns actually look like on
/// the wire. Each turn is logged at info level, truncated to `max_chars`.
pub struct InspectingProvider {
    inner: Arc<dyn Provider>,
    logger: Arc<dyn Logger>,
    max_chars: usize,
}

impl InspectingProvider {
    pub fn new(inner: Arc<dyn Provider>, logger: Arc<dyn Logger>) -> Self {
        Self {
            inner,
            logger,
            max_chars: DEFAULT_INSPECT_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Render one turn as it is logged
    pub fn render_turn(&self, message: &ChatMessage) -> String {
        let text = message.flattened_text();
        let body = truncate(text.trim(), self.max_chars);
        match message.tool_call_id() {
            Some(id) => format!("{} [{}]: {}", message.role, id, body),
            None => format!("{}: {}", message.role, body),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[async_trait]
impl Provider for InspectingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_api_base(&self) -> &str {
        self.inner.default_api_base()
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<Completion> {
        self.logger.info(&format!(
            "[InspectingProvider] Prompt to {} ({} turns, {} tools):",
            self.inner.name(),
            messages.len(),
            options.tools.len()
        ));
        for message in &messages {
            self.logger.info(&format!("[InspectingProvider]   {}", self.render_turn(message)));
        }

        self.inner.complete(messages, model, options, cancel_token).await
    }

    async fn count_tokens(&self, text: &str) -> ProviderResult<usize> {
        self.inner.count_tokens(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use crate::types::{ToolCall, ToolResult};
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct CaptureLogger {
        lines: Mutex<Vec<String>>,
    }

    impl Logger for CaptureLogger {
        fn debug(&self, _msg: &str) {}
        fn info(&self, msg: &str) {
            self.lines.lock().push(msg.to_string());
        }
        fn warn(&self, _msg: &str) {}
        fn error(&self, _msg: &str) {}
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("28°C and sunny", 4), "28°C...");
        assert_eq!(truncate("short", 300), "short");
    }

    #[tokio::test]
    async fn test_logs_each_turn_and_forwards() {
        let logger = Arc::new(CaptureLogger::default());
        let inner = Arc::new(MockProvider::echo(logger.clone()));
        let provider = InspectingProvider::new(inner.clone(), logger.clone()).with_max_chars(10);

        let call = ToolCall::new("call_1", "getWeather", json!({"location": "New York, NY"}));
        let messages = vec![
            ChatMessage::user("Which city is hotter, LA or NY?"),
            ChatMessage::assistant_tool_calls(None, &[call]),
            ChatMessage::tool_result(&ToolResult::success("call_1", "22°C")),
        ];

        let result = provider
            .complete(messages, ProviderModelConfig::new("mock"), CompletionOptions::default(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result, Completion::Answer("Echo: Which city is hotter, LA or NY?".to_string()));
        assert_eq!(inner.call_count(), 1);

        let lines = logger.lines.lock();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with("user: Which city..."));
        assert!(lines[2].ends_with("assistant: [call getW..."));
        assert!(lines[3].ends_with("tool [call_1]: 22°C"));
    }
}
