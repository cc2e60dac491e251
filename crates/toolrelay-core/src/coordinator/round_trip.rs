//! Outcome of a successful round trip

use serde_json::Value;

use super::error::ErrorKind;
use super::state::RoundTripState;
use crate::types::{ToolCall, ToolResult};

/// The final answer
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Text(String),
    /// A payload that passed schema validation
    Structured(Value),
}

impl Answer {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            Answer::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Answer::Structured(value) => Some(value),
            Answer::Text(_) => None,
        }
    }
}

/// Report of one round trip
#[derive(Debug, Clone)]
pub struct RoundTrip {
    pub answer: Answer,
    /// Every tool call the provider requested, in request order
    pub tool_calls: Vec<ToolCall>,
    /// One result per tool call, same order and ids
    pub tool_results: Vec<ToolResult>,
    pub provider_calls: usize,
    /// Number of tool batches executed
    pub tool_rounds: usize,
    /// Turns this round trip added to the session
    pub appended_turns: usize,
    /// States visited, ending in `Answered`
    pub transitions: Vec<RoundTripState>,
}

impl RoundTrip {
    pub fn state(&self) -> RoundTripState {
        self.transitions.last().copied().unwrap_or(RoundTripState::Answered)
    }

    pub fn text(&self) -> Option<&str> {
        self.answer.as_text()
    }

    /// Tool results that carry a failure, with their kind
    pub fn tool_failures(&self) -> Vec<(&ToolResult, ErrorKind)> {
        self.tool_results
            .iter()
            .filter_map(|r| ErrorKind::of_tool_result(r).map(|kind| (r, kind)))
            .collect()
    }
}
