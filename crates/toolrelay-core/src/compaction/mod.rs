//! Conversation compaction
//!
//! When a session's estimated token count passes
//! `max_tokens_before_summary`, everything but the last `messages_to_keep`
//! turns is summarized by one provider call and replaced by a single user
//! turn starting with [`SUMMARY_PREFIX`]. A tool-result turn is never
//! separated from the assistant turn that requested it; the cut moves
//! earlier instead.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::logging::Logger;
use crate::providers::{Completion, CompletionOptions, Provider, ProviderError, ProviderModelConfig, ProviderResult};
use crate::session::Session;
use crate::types::{CancellationToken, ChatMessage, MessageRole};

/// First line of the turn that replaces summarized history
pub const SUMMARY_PREFIX: &str = "Here is a summary of the conversation to date:";

const SUMMARY_INSTRUCTIONS: &str = "Summarize the conversation below so it can replace the original turns. \
Keep names, numbers, tool results and anything the user asked for that is still open. \
Reply with the summary only.";

/// When to compact and how much to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionPolicy {
    /// Compact once the estimate exceeds this many tokens
    pub max_tokens_before_summary: usize,
    /// Turns kept verbatim at the end of the conversation
    pub messages_to_keep: usize,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            max_tokens_before_summary: 200,
            messages_to_keep: 2,
        }
    }
}

/// Index of the first turn to keep verbatim
///
/// Never lands on a tool-result turn, so requests and their results stay
/// together. Zero means there is nothing to summarize.
pub fn cut_point(messages: &[ChatMessage], messages_to_keep: usize) -> usize {
    let mut cut = messages.len().saturating_sub(messages_to_keep);
    while cut > 0 && cut < messages.len() && messages[cut].role == MessageRole::Tool {
        cut -= 1;
    }
    cut
}

/// Summarizes old turns of a session through a provider
pub struct Compactor {
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    policy: CompactionPolicy,
    logger: Arc<dyn Logger>,
}

impl Compactor {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: ProviderModelConfig,
        policy: CompactionPolicy,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            model,
            policy,
            logger,
        }
    }

    pub fn policy(&self) -> &CompactionPolicy {
        &self.policy
    }

    /// Provider's token estimate for the whole prompt
    pub async fn estimate_tokens(&self, session: &Session) -> ProviderResult<usize> {
        let mut total = 0;
        if let Some(system) = session.system_prompt() {
            total += self.provider.count_tokens(system).await?;
        }
        for message in session.messages() {
            total += self.provider.count_tokens(&message.flattened_text()).await?;
        }
        Ok(total)
    }

    /// Compact the session if the policy says so
    ///
    /// Returns the new summary, or `None` when nothing was compacted.
    pub async fn compact(&self, session: &mut Session, cancel_token: &CancellationToken) -> ProviderResult<Option<String>> {
        let tokens = self.estimate_tokens(session).await?;
        if tokens <= self.policy.max_tokens_before_summary {
            return Ok(None);
        }

        let cut = cut_point(session.messages(), self.policy.messages_to_keep);
        if cut == 0 {
            self.logger.debug(&format!(
                "[Compactor] {} tokens over budget but no turns can be summarized",
                tokens
            ));
            return Ok(None);
        }

        self.logger.info(&format!(
            "[Compactor] Summarizing {} of {} turns (~{} tokens)",
            cut,
            session.len(),
            tokens
        ));

        let summary = self.summarize(&session.messages()[..cut], cancel_token).await?;
        let turn = ChatMessage::user(format!("{}\n\n{}", SUMMARY_PREFIX, summary));
        session.replace_prefix(cut, turn, summary.clone());

        Ok(Some(summary))
    }

    async fn summarize(&self, turns: &[ChatMessage], cancel_token: &CancellationToken) -> ProviderResult<String> {
        let transcript = turns
            .iter()
            .map(|m| format!("{}: {}", m.role, m.flattened_text()))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = vec![ChatMessage::system(SUMMARY_INSTRUCTIONS), ChatMessage::user(transcript)];
        let completion = self
            .provider
            .complete(prompt, self.model.clone(), CompletionOptions::default(), cancel_token.clone())
            .await?;

        match completion {
            Completion::Answer(text) => Ok(text.trim().to_string()),
            Completion::ToolCalls { .. } => Err(ProviderError::invalid_response(
                self.provider.name(),
                "summarization request answered with tool calls",
            )),
        }
    }
}

impl std::fmt::Debug for Compactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compactor")
            .field("provider", &self.provider.name())
            .field("model", &self.model.model)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::providers::{MockProvider, MockStep};
    use crate::types::{ToolCall, ToolResult};
    use serde_json::json;

    fn weather_exchange() -> Vec<ChatMessage> {
        let call = ToolCall::new("call_1", "getWeather", json!({"location": "Los Angeles, CA"}));
        vec![
            ChatMessage::user("What's the weather in LA?"),
            ChatMessage::assistant_tool_calls(None, &[call]),
            ChatMessage::tool_result(&ToolResult::success("call_1", "28°C")),
            ChatMessage::assistant("It is 28°C in Los Angeles."),
        ]
    }

    fn compactor(provider: Arc<MockProvider>, policy: CompactionPolicy) -> Compactor {
        Compactor::new(provider, ProviderModelConfig::new("mock"), policy, NoOpLogger::shared())
    }

    #[test]
    fn test_cut_point_keeps_tool_results_with_request() {
        let messages = weather_exchange();
        assert_eq!(cut_point(&messages, 1), 3);
        // Keeping two would start on the tool result; move back to the request
        assert_eq!(cut_point(&messages, 2), 1);
        assert_eq!(cut_point(&messages, 10), 0);
    }

    #[tokio::test]
    async fn test_under_budget_is_untouched() {
        let provider = Arc::new(MockProvider::fixed("unused", NoOpLogger::shared()));
        let compactor = compactor(provider.clone(), CompactionPolicy::default());
        let mut session = Session::from_messages(weather_exchange());

        let result = compactor.compact(&mut session, &CancellationToken::new()).await.unwrap();
        assert_eq!(result, None);
        assert_eq!(session.len(), 4);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_over_budget_replaces_prefix() {
        let provider = Arc::new(MockProvider::fixed("User asked about LA weather.", NoOpLogger::shared()));
        let policy = CompactionPolicy {
            max_tokens_before_summary: 5,
            messages_to_keep: 2,
        };
        let compactor = compactor(provider.clone(), policy);
        let mut session = Session::from_messages(weather_exchange());

        let summary = compactor.compact(&mut session, &CancellationToken::new()).await.unwrap();
        assert_eq!(summary.as_deref(), Some("User asked about LA weather."));

        // Summary turn, then the tool request, its result and the answer
        assert_eq!(session.len(), 4);
        let first = session.messages()[0].text().unwrap();
        assert!(first.starts_with(SUMMARY_PREFIX));
        assert!(session.messages()[1].has_tool_calls());
        assert_eq!(session.latest_summary(), Some("User asked about LA weather."));

        let request = &provider.requests()[0];
        assert!(request.options.tools.is_empty());
        assert!(request.messages[1].flattened_text().contains("What's the weather in LA?"));
    }

    #[tokio::test]
    async fn test_tool_calls_in_summary_are_rejected() {
        let call = ToolCall::new("x", "getWeather", json!({}));
        let provider = Arc::new(MockProvider::scripted(vec![MockStep::tool_calls(vec![call])], NoOpLogger::shared()));
        let policy = CompactionPolicy {
            max_tokens_before_summary: 0,
            messages_to_keep: 1,
        };
        let compactor = compactor(provider, policy);
        let mut session = Session::from_messages(weather_exchange());

        let err = compactor.compact(&mut session, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
        assert_eq!(session.len(), 4);
    }

    #[test]
    fn test_policy_defaults_from_yaml() {
        let policy: CompactionPolicy = serde_yaml::from_str("messages_to_keep: 4").unwrap();
        assert_eq!(policy.max_tokens_before_summary, 200);
        assert_eq!(policy.messages_to_keep, 4);
    }
}
