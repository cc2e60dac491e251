//! Caller-owned conversation state
//!
//! A `Session` holds the running conversation between round trips. The
//! coordinator borrows it for the duration of one round trip and keeps
//! nothing afterwards, so two sessions never share state.

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, MessageRole};

/// One conversation, created and closed explicitly by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Sent ahead of the conversation on every provider call, never logged as a turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    system_prompt: Option<String>,
    conversation: Vec<ChatMessage>,
    /// Summary produced by the most recent compaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest_summary: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Resume from an existing transcript
    ///
    /// A leading system turn becomes the system prompt.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        let mut messages = messages;
        let system_prompt = match messages.first() {
            Some(first) if first.role == MessageRole::System => {
                Some(messages.remove(0).flattened_text())
            }
            _ => None,
        };
        Self {
            system_prompt,
            conversation: messages,
            latest_summary: None,
        }
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.conversation
    }

    pub fn len(&self) -> usize {
        self.conversation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty()
    }

    pub fn latest_summary(&self) -> Option<&str> {
        self.latest_summary.as_deref()
    }

    /// Text of the last assistant turn, if any
    pub fn last_answer(&self) -> Option<&str> {
        self.conversation
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && !m.has_tool_calls())
            .and_then(ChatMessage::text)
    }

    /// The full prompt for a provider call: system prompt first, then every turn
    pub fn prompt(&self) -> Vec<ChatMessage> {
        let mut prompt = Vec::with_capacity(self.conversation.len() + 1);
        if let Some(system) = &self.system_prompt {
            prompt.push(ChatMessage::system(system.clone()));
        }
        prompt.extend(self.conversation.iter().cloned());
        prompt
    }

    /// End the session, handing back its transcript
    pub fn close(self) -> Vec<ChatMessage> {
        self.conversation
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.conversation.push(message);
    }

    /// Drop every turn after `len`
    pub(crate) fn truncate(&mut self, len: usize) {
        self.conversation.truncate(len);
    }

    /// Replace the first `cut` turns with a single summary turn
    pub(crate) fn replace_prefix(&mut self, cut: usize, summary_turn: ChatMessage, summary: String) {
        let cut = cut.min(self.conversation.len());
        self.conversation.splice(..cut, std::iter::once(summary_turn));
        self.latest_summary = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolCall, ToolResult};
    use serde_json::json;

    #[test]
    fn test_prompt_puts_system_first() {
        let mut session = Session::new().with_system_prompt("You are a helpful assistant.");
        session.push(ChatMessage::user("hi"));

        let prompt = session.prompt();
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].role, MessageRole::System);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_from_messages_lifts_system_turn() {
        let session = Session::from_messages(vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ]);
        assert_eq!(session.system_prompt(), Some("Be brief."));
        assert_eq!(session.len(), 2);
        assert_eq!(session.last_answer(), Some("hello"));
    }

    #[test]
    fn test_last_answer_skips_tool_requests() {
        let mut session = Session::new();
        session.push(ChatMessage::user("weather?"));
        assert_eq!(session.last_answer(), None);

        let call = ToolCall::new("call_1", "getWeather", json!({"location": "New York, NY"}));
        session.push(ChatMessage::assistant_tool_calls(Some("checking".into()), &[call]));
        session.push(ChatMessage::tool_result(&ToolResult::success("call_1", "22°C")));
        assert_eq!(session.last_answer(), None);
    }

    #[test]
    fn test_replace_prefix_records_summary() {
        let mut session = Session::new();
        for i in 0..4 {
            session.push(ChatMessage::user(format!("turn {}", i)));
        }
        session.replace_prefix(3, ChatMessage::user("summary turn"), "summary".to_string());

        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[0].text(), Some("summary turn"));
        assert_eq!(session.messages()[1].text(), Some("turn 3"));
        assert_eq!(session.latest_summary(), Some("summary"));
    }

    #[test]
    fn test_close_and_serde() {
        let mut session = Session::new().with_system_prompt("sys");
        session.push(ChatMessage::user("hi"));

        let yaml = serde_yaml::to_string(&session).unwrap();
        let restored: Session = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(restored, session);

        let transcript = session.close();
        assert_eq!(transcript.len(), 1);
    }
}
