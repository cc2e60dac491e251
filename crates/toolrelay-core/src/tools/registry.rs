//! Tool catalog for the round trip
//!
//! The ToolRegistry is the central component for:
//! - Holding the descriptors registered at construction
//! - Filtering tools by enabled state and name
//! - Converting tools to the provider-facing format
//! - Executing tool calls and packaging their results

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::handler::{FnTool, ToolError, ToolHandler, ToolOutput};
use crate::logging::Logger;
use crate::structured::{Schema, SchemaValidator};
use crate::types::{Tool, ToolCall, ToolResult};

/// A callable capability advertised to the provider
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    parameters: Schema,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    /// Create a descriptor backed by a handler
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Schema,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(handler),
        }
    }

    /// Create a descriptor backed by a synchronous closure
    pub fn from_fn<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Schema,
        func: F,
    ) -> Self
    where
        F: Fn(&Value) -> ToolOutput + Send + Sync + 'static,
    {
        Self::new(name, description, parameters, FnTool::new(func))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &Schema {
        &self.parameters
    }

    /// Provider-facing definition
    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name.clone(), self.description.clone())
            .with_schema(self.parameters.to_json_schema())
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters.name)
            .finish()
    }
}

/// Information about a registered tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for tool parameters
    pub input_schema: Value,
    /// Whether this tool is enabled
    pub enabled: bool,
}

/// Filter for tool listing
#[derive(Debug, Clone)]
pub struct ToolFilter {
    /// If set, only include tools with these names
    pub include: Option<HashSet<String>>,
    /// Exclude tools with these names
    pub exclude: HashSet<String>,
    /// Only include enabled tools (default: true)
    pub only_enabled: bool,
}

impl Default for ToolFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolFilter {
    pub fn new() -> Self {
        Self {
            include: None,
            exclude: HashSet::new(),
            only_enabled: true,
        }
    }

    /// Include all tools, enabled or not
    pub fn all() -> Self {
        Self {
            only_enabled: false,
            ..Self::new()
        }
    }

    /// Include only specific tools
    pub fn with_include(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.include = Some(names.into_iter().collect());
        self
    }

    /// Exclude specific tools
    pub fn with_exclude(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude = names.into_iter().collect();
        self
    }

    /// Check if a tool matches this filter
    pub fn matches(&self, tool: &ToolInfo) -> bool {
        if self.only_enabled && !tool.enabled {
            return false;
        }

        if self.exclude.contains(&tool.name) {
            return false;
        }

        if let Some(ref include) = self.include {
            if !include.contains(&tool.name) {
                return false;
            }
        }

        true
    }
}

/// Catalog of the tools available to one coordinator
///
/// Descriptors are registered before the registry is shared; afterwards only
/// the enabled flags change.
pub struct ToolRegistry {
    /// Descriptors in registration order
    tools: Vec<ToolDescriptor>,
    /// Name -> index into `tools`
    index: HashMap<String, usize>,
    /// User-configured enabled/disabled state
    disabled: RwLock<HashSet<String>>,
    /// Execute a batch concurrently instead of one by one
    parallel: bool,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            disabled: RwLock::new(HashSet::new()),
            parallel: false,
            logger,
        }
    }

    /// Create a registry from a list of descriptors
    pub fn with_tools(
        tools: impl IntoIterator<Item = ToolDescriptor>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, ToolError> {
        let mut registry = Self::new(logger);
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Run independent calls of one batch concurrently
    ///
    /// Results are still returned in request order.
    pub fn with_parallel_execution(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Add a tool; names must be unique
    pub fn register(&mut self, tool: ToolDescriptor) -> Result<(), ToolError> {
        if self.index.contains_key(tool.name()) {
            return Err(ToolError::Duplicate(tool.name().to_string()));
        }
        self.logger.debug(&format!("[ToolRegistry] Registered tool: {}", tool.name()));
        self.index.insert(tool.name().to_string(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    fn info(&self, tool: &ToolDescriptor) -> ToolInfo {
        ToolInfo {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.parameters.to_json_schema(),
            enabled: !self.disabled.read().contains(&tool.name),
        }
    }

    /// Get tools matching a filter
    pub fn get_tools(&self, filter: &ToolFilter) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| self.info(t))
            .filter(|t| filter.matches(t))
            .collect()
    }

    /// Get tools for sending to the provider (enabled only)
    pub fn llm_tools(&self) -> Vec<Tool> {
        let disabled = self.disabled.read();
        self.tools
            .iter()
            .filter(|t| !disabled.contains(&t.name))
            .map(ToolDescriptor::to_tool)
            .collect()
    }

    /// Resolve an enabled tool by exact name
    pub fn resolve(&self, name: &str) -> Option<&ToolDescriptor> {
        if self.disabled.read().contains(name) {
            return None;
        }
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Enable or disable a tool
    pub fn set_tool_enabled(&self, name: &str, enabled: bool) {
        let mut disabled = self.disabled.write();
        if enabled {
            disabled.remove(name);
        } else {
            disabled.insert(name.to_string());
        }
    }

    /// Invoke a tool by name, validating arguments first
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolOutput {
        let tool = self
            .resolve(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        if let Err(errors) = SchemaValidator::lenient(&tool.parameters).validate(&arguments) {
            let joined = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            return Err(ToolError::InvalidArguments(joined));
        }

        self.logger.info(&format!("[ToolRegistry] Calling tool: {}", name));
        match AssertUnwindSafe(tool.handler.invoke(arguments)).catch_unwind().await {
            Ok(output) => output,
            Err(payload) => Err(ToolError::ExecutionFailed(format!(
                "panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    /// Execute one tool call from a provider response
    ///
    /// Failures never escape: they become an error result carrying the cause.
    pub async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolResult {
        match self.call_tool(&tool_call.name, tool_call.input.clone()).await {
            Ok(content) => ToolResult::success(tool_call.id.clone(), content),
            Err(e) => {
                self.logger.warn(&format!(
                    "[ToolRegistry] Call {} ({}) failed: {}",
                    tool_call.id, tool_call.name, e
                ));
                ToolResult::error(tool_call.id.clone(), e.to_string())
            }
        }
    }

    /// Execute a batch of tool calls, returning results in request order
    pub async fn execute_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<ToolResult> {
        if self.parallel {
            return join_all(tool_calls.iter().map(|call| self.execute_tool_call(call))).await;
        }

        let mut results = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            results.push(self.execute_tool_call(call).await);
        }
        results
    }

    /// Get count of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Get count of enabled tools
    pub fn enabled_tool_count(&self) -> usize {
        self.get_tools(&ToolFilter::new()).len()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools)
            .field("parallel", &self.parallel)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}
