//! Tool handler trait and closure adapter

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while resolving or invoking a tool
///
/// The `Display` text of `NotFound` and `ExecutionFailed` is what the
/// provider sees as the tool's result content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No enabled tool with this name is registered
    #[error("tool unavailable: {0}")]
    NotFound(String),

    /// The tool ran and failed
    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),

    /// Arguments did not match the tool's parameter schema
    #[error("tool execution failed: invalid arguments: {0}")]
    InvalidArguments(String),

    /// A tool with this name is already in the catalog
    #[error("tool already registered: {0}")]
    Duplicate(String),
}

impl ToolError {
    /// Create an execution failure from any displayable cause
    pub fn failed(cause: impl std::fmt::Display) -> Self {
        Self::ExecutionFailed(cause.to_string())
    }
}

pub type ToolOutput = Result<String, ToolError>;

/// A locally executable capability
///
/// Implementations may have arbitrary side effects. They are invoked at most
/// once per request and never retried by the caller.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute with the provider-supplied arguments (a JSON object)
    async fn invoke(&self, arguments: Value) -> ToolOutput;
}

/// Adapts a synchronous closure into a [`ToolHandler`]
pub struct FnTool<F> {
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(&Value) -> ToolOutput + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> ToolHandler for FnTool<F>
where
    F: Fn(&Value) -> ToolOutput + Send + Sync,
{
    async fn invoke(&self, arguments: Value) -> ToolOutput {
        (self.func)(&arguments)
    }
}

/// Read a required string argument
pub fn require_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing string argument '{}'", key)))
}
