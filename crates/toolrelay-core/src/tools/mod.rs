//! Tool management module
//!
//! Tools are locally executable capabilities the provider may request by
//! name. This module holds the catalog handed to the provider and executes
//! the calls it requests.
//!
//! ```text
//!   provider response            ToolRegistry
//!  ┌───────────────────┐       ┌──────────────────────────────┐
//!  │ ToolCall{id,name} │ ────▶ │ resolve by exact name        │
//!  │ ToolCall{id,name} │       │ validate against parameters  │
//!  └───────────────────┘       │ invoke ToolHandler           │
//!                              └──────────────┬───────────────┘
//!                                             ▼
//!                              ToolResult{call_id, content, is_error}
//!                              (one per call, request order)
//! ```

mod handler;
mod registry;

pub use handler::{require_str, FnTool, ToolError, ToolHandler, ToolOutput};
pub use registry::{ToolDescriptor, ToolFilter, ToolInfo, ToolRegistry};
