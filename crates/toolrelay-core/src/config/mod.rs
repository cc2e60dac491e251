//! Configuration
//!
//! One YAML file selects the provider and tunes the coordinator:
//! - `FileConfigProvider`: user (`~/.config/toolrelay/config.yaml`) or
//!   workspace (`<root>/.config/toolrelay/config.yaml`) level
//! - `MemoryConfigProvider`: in-memory for testing
//!
//! ```yaml
//! provider:
//!   name: openai
//!   model: gpt-4.1-nano
//!   temperature: 0.0
//! coordinator:
//!   max_tool_rounds: 4
//!   parallel_tools: false
//! compaction:
//!   max_tokens_before_summary: 200
//!   messages_to_keep: 2
//! ```

mod traits;
mod memory;
mod file;

pub use traits::{ConfigProvider, ConfigError, ConfigResult};
pub use memory::MemoryConfigProvider;
pub use file::{ConfigFile, ConfigLevel, CoordinatorSettings, FileConfigProvider, ProviderSettings};
