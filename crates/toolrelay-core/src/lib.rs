//! toolrelay core
//!
//! Runtime-agnostic tool-calling round trips against LLM providers.
//!
//! A caller sends a request through a [`Coordinator`]. The provider either
//! answers or asks for local tools; the coordinator runs them, sends every
//! result back under its correlation id and returns the provider's final
//! answer, optionally as a schema-validated structured payload.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toolrelay_core::{
//!     Coordinator, EnvSecretStore, Field, NoOpLogger, ProviderModelConfig, Schema, Session,
//!     ToolDescriptor, ToolRegistry,
//! };
//! use toolrelay_core::providers::create_provider;
//! use toolrelay_core::tools::require_str;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = NoOpLogger::shared();
//! let weather = ToolDescriptor::from_fn(
//!     "getWeather",
//!     "Get weather for a location",
//!     Schema::new("getWeather").field(Field::string("location", "City and state")),
//!     |args| Ok(format!("Weather in {}: 28°C", require_str(args, "location")?)),
//! );
//! let tools = Arc::new(ToolRegistry::with_tools(vec![weather], logger.clone())?);
//! let provider = create_provider("openai", Arc::new(EnvSecretStore::new()), logger.clone());
//!
//! let coordinator = Coordinator::new(provider, tools, ProviderModelConfig::new("gpt-4.1-nano"), logger);
//! let mut session = Session::new();
//! let round_trip = coordinator.run(&mut session, "What's the weather in Los Angeles, CA?").await?;
//! println!("{}", round_trip.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod types;
pub mod structured;
pub mod tools;
pub mod providers;
pub mod coordinator;
pub mod session;
pub mod compaction;
pub mod config;
pub mod secrets;
pub mod logging;

// Re-export commonly used types
pub use types::{
    CancellationToken, ChatMessage, ContentPart, MessageContent, MessageRole, Tool, ToolCall,
    ToolChoice, ToolResult,
};

pub use structured::{parse_payload, Field, FieldType, Schema, SchemaValidator, ValidationError};

pub use tools::{FnTool, ToolDescriptor, ToolError, ToolFilter, ToolHandler, ToolRegistry};

pub use providers::{
    create_provider, supported_providers, Completion, CompletionOptions, GenaiProvider,
    InspectingProvider, MockProvider, MockStep, Provider, ProviderError, ProviderModelConfig,
    ProviderResult,
};

pub use coordinator::{
    Answer, Coordinator, CoordinatorOptions, ErrorKind, RoundTrip, RoundTripError,
    RoundTripResult, RoundTripState, DEFAULT_MAX_TOOL_ROUNDS,
};

pub use session::Session;

pub use compaction::{CompactionPolicy, Compactor, SUMMARY_PREFIX};

pub use config::{ConfigError, ConfigFile, ConfigProvider, ConfigResult, FileConfigProvider, MemoryConfigProvider};

pub use secrets::{
    ChainSecretStore, EnvSecretStore, MemorySecretStore, SecretStore, SecretStoreError,
    SecretStoreResult,
};

pub use logging::{ConsoleLogger, LogLevel, Logger, NoOpLogger, SharedLogger};
