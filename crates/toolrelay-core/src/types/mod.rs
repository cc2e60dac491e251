//! Core types for tool-calling conversations
//!
//! This module contains all the shared types used across providers.

mod message;
mod tool;
mod cancellation;

pub use message::{ChatMessage, ContentPart, MessageRole, MessageContent};
pub use tool::{Tool, ToolCall, ToolResult, ToolChoice};
pub use cancellation::CancellationToken;
