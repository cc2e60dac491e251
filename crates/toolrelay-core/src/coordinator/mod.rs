//! Round-trip coordinator
//!
//! Drives one user request through the provider, executing whatever tools
//! the provider asks for and sending the results back until it answers.
//!
//! ```text
//!   user request ──► Provider ──answer──────────────────────► RoundTrip
//!                      │  ▲
//!            tool calls│  │tool results (same ids, same order)
//!                      ▼  │
//!                   ToolRegistry
//! ```
//!
//! The caller owns the [`Session`]; the coordinator only borrows it for one
//! round trip. A failed round trip leaves the session as it was before the
//! request.

mod error;
mod round_trip;
mod state;

pub use error::{ErrorKind, RoundTripError, RoundTripResult};
pub use round_trip::{Answer, RoundTrip};
pub use state::{IllegalTransition, RoundTripState, StateTracker};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::compaction::Compactor;
use crate::config::ConfigFile;
use crate::logging::Logger;
use crate::providers::{
    create_provider, Completion, CompletionOptions, Provider, ProviderError, ProviderModelConfig,
};
use crate::secrets::SecretStore;
use crate::session::Session;
use crate::structured::{parse_payload, Schema, SchemaValidator, ValidationError};
use crate::tools::ToolRegistry;
use crate::types::{CancellationToken, ChatMessage, ToolCall, ToolChoice, ToolResult};

/// Tool batches allowed per round trip unless configured otherwise
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 4;

/// Per-coordinator request settings
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorOptions {
    /// Tool batches allowed before the round trip fails
    pub max_tool_rounds: usize,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tool_choice: ToolChoice,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            temperature: None,
            max_tokens: None,
            tool_choice: ToolChoice::Auto,
        }
    }
}

/// Executes round trips against one provider and one tool catalog
pub struct Coordinator {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: ProviderModelConfig,
    options: CoordinatorOptions,
    compactor: Option<Compactor>,
    logger: Arc<dyn Logger>,
}

impl Coordinator {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        model: ProviderModelConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            tools,
            model,
            options: CoordinatorOptions::default(),
            compactor: None,
            logger,
        }
    }

    pub fn with_options(mut self, options: CoordinatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Compact the session before each new request
    pub fn with_compactor(mut self, compactor: Compactor) -> Self {
        self.compactor = Some(compactor);
        self
    }

    /// Build a coordinator from a loaded configuration file
    ///
    /// The provider comes from [`create_provider`]; compaction is enabled
    /// when the file has a `compaction` section.
    pub fn from_config(
        config: &ConfigFile,
        tools: ToolRegistry,
        secrets: Arc<dyn SecretStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let provider = create_provider(&config.provider.name, secrets, Arc::clone(&logger));

        let mut model = ProviderModelConfig::new(config.provider.model.clone());
        if let Some(base) = &config.provider.api_base {
            model = model.with_api_base(base.clone());
        }

        let options = CoordinatorOptions {
            max_tool_rounds: config.coordinator.max_tool_rounds,
            temperature: config.provider.temperature,
            max_tokens: config.provider.max_tokens,
            tool_choice: ToolChoice::Auto,
        };

        let tools = Arc::new(tools.with_parallel_execution(config.coordinator.parallel_tools));
        let mut coordinator =
            Self::new(Arc::clone(&provider), tools, model.clone(), Arc::clone(&logger)).with_options(options);

        if let Some(policy) = config.compaction {
            coordinator = coordinator.with_compactor(Compactor::new(provider, model, policy, logger));
        }
        coordinator
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    /// Run a request to a text answer
    pub async fn run(&self, session: &mut Session, request: impl Into<String>) -> RoundTripResult<RoundTrip> {
        self.run_with_cancel(session, request, &CancellationToken::new()).await
    }

    /// Run a request, stopping early if `cancel_token` fires
    pub async fn run_with_cancel(
        &self,
        session: &mut Session,
        request: impl Into<String>,
        cancel_token: &CancellationToken,
    ) -> RoundTripResult<RoundTrip> {
        self.execute(session, request.into(), None, cancel_token).await
    }

    /// Run a request whose final answer must be a payload matching `schema`
    pub async fn run_structured(
        &self,
        session: &mut Session,
        request: impl Into<String>,
        schema: &Schema,
        cancel_token: &CancellationToken,
    ) -> RoundTripResult<RoundTrip> {
        self.execute(session, request.into(), Some(schema), cancel_token).await
    }

    /// Like [`run_structured`](Self::run_structured), deserializing the payload into `T`
    pub async fn run_structured_as<T: DeserializeOwned>(
        &self,
        session: &mut Session,
        request: impl Into<String>,
        schema: &Schema,
        cancel_token: &CancellationToken,
    ) -> RoundTripResult<(T, RoundTrip)> {
        let round_trip = self.run_structured(session, request, schema, cancel_token).await?;

        let payload = round_trip.answer.as_structured().cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<T>(payload.clone()) {
            Ok(value) => Ok((value, round_trip)),
            Err(e) => {
                session.truncate(session.len().saturating_sub(round_trip.appended_turns));
                Err(RoundTripError::SchemaValidationFailed {
                    errors: vec![ValidationError::new(
                        "$",
                        format!("payload does not fit {}: {}", std::any::type_name::<T>(), e),
                    )],
                    payload: payload.to_string(),
                })
            }
        }
    }

    async fn execute(
        &self,
        session: &mut Session,
        request: String,
        schema: Option<&Schema>,
        cancel_token: &CancellationToken,
    ) -> RoundTripResult<RoundTrip> {
        let mut tracker = StateTracker::new();

        if let Some(compactor) = &self.compactor {
            if let Err(e) = compactor.compact(session, cancel_token).await {
                let err = RoundTripError::from(e);
                self.advance(&mut tracker, RoundTripState::Failed(err.kind()));
                self.logger.error(&format!("[Coordinator] Round trip failed: {}", err));
                return Err(err);
            }
        }

        let checkpoint = session.len();

        match self.drive(session, request, schema, &mut tracker, cancel_token).await {
            Ok(round_trip) => Ok(round_trip),
            Err(err) => {
                self.advance(&mut tracker, RoundTripState::Failed(err.kind()));
                self.logger.error(&format!("[Coordinator] Round trip failed: {}", err));
                session.truncate(checkpoint);
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        session: &mut Session,
        request: String,
        schema: Option<&Schema>,
        tracker: &mut StateTracker,
        cancel_token: &CancellationToken,
    ) -> RoundTripResult<RoundTrip> {
        let options = self.completion_options(schema);
        let start = session.len();
        let mut tool_calls = Vec::new();
        let mut tool_results = Vec::new();
        let mut provider_calls = 0;
        let mut tool_rounds = 0;

        self.logger.info(&format!(
            "[Coordinator] Request with {} tools offered",
            options.tools.len()
        ));
        session.push(ChatMessage::user(request));

        loop {
            let completion = self.call_provider(session, &options, cancel_token).await?;
            provider_calls += 1;

            let (text, calls) = match completion {
                Completion::Answer(text) => {
                    let answer = match schema {
                        Some(schema) => Answer::Structured(validate_payload(schema, &text)?),
                        None => Answer::Text(text.clone()),
                    };
                    session.push(ChatMessage::assistant(text));
                    self.advance(tracker, RoundTripState::Answered);
                    self.logger.info(&format!(
                        "[Coordinator] Answered after {} provider calls and {} tool calls",
                        provider_calls,
                        tool_calls.len()
                    ));

                    return Ok(RoundTrip {
                        answer,
                        tool_calls,
                        tool_results,
                        provider_calls,
                        tool_rounds,
                        appended_turns: session.len() - start,
                        transitions: tracker.history().to_vec(),
                    });
                }
                Completion::ToolCalls { text, calls } => (text, calls),
            };

            self.check_tool_calls(&calls)?;
            if tool_rounds >= self.options.max_tool_rounds {
                return Err(RoundTripError::RoundTripLimitExceeded {
                    limit: self.options.max_tool_rounds,
                    unresolved: calls,
                });
            }
            tool_rounds += 1;

            self.advance(tracker, RoundTripState::AwaitingToolResults);
            session.push(ChatMessage::assistant_tool_calls(text, &calls));

            let results = self.execute_tools(&calls, cancel_token).await?;
            for result in &results {
                session.push(ChatMessage::tool_result(result));
            }
            self.advance(tracker, RoundTripState::AwaitingSecondResponse);

            tool_calls.extend(calls);
            tool_results.extend(results);
        }
    }

    fn completion_options(&self, schema: Option<&Schema>) -> CompletionOptions {
        let mut options = CompletionOptions::new()
            .with_tools(self.tools.llm_tools())
            .with_tool_choice(self.options.tool_choice);
        if let Some(temperature) = self.options.temperature {
            options = options.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.options.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }
        if let Some(schema) = schema {
            options = options.with_output_schema(schema.clone());
        }
        options
    }

    async fn call_provider(
        &self,
        session: &Session,
        options: &CompletionOptions,
        cancel_token: &CancellationToken,
    ) -> RoundTripResult<Completion> {
        let prompt = session.prompt();
        self.logger.debug(&format!(
            "[Coordinator] Calling {} with {} turns",
            self.provider.name(),
            prompt.len()
        ));

        let call = self
            .provider
            .complete(prompt, self.model.clone(), options.clone(), cancel_token.clone());
        match cancel_token.run_until_cancelled(call).await {
            Some(result) => Ok(result?),
            None => Err(RoundTripError::Cancelled),
        }
    }

    /// Reject batches the results could not be correlated with
    fn check_tool_calls(&self, calls: &[ToolCall]) -> RoundTripResult<()> {
        let invalid = |message: String| {
            RoundTripError::ProviderUnavailable(ProviderError::invalid_response(self.provider.name(), message))
        };

        if calls.is_empty() {
            return Err(invalid("tool call batch is empty".to_string()));
        }
        let mut seen = HashSet::with_capacity(calls.len());
        for call in calls {
            if call.id.is_empty() {
                return Err(invalid(format!("tool call {} has no correlation id", call.name)));
            }
            if !seen.insert(call.id.as_str()) {
                return Err(invalid(format!("duplicate correlation id {}", call.id)));
            }
        }
        Ok(())
    }

    async fn execute_tools(
        &self,
        calls: &[ToolCall],
        cancel_token: &CancellationToken,
    ) -> RoundTripResult<Vec<ToolResult>> {
        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        self.logger.info(&format!("[Coordinator] Executing tools: {}", names.join(", ")));

        cancel_token
            .run_until_cancelled(self.tools.execute_tool_calls(calls))
            .await
            .ok_or(RoundTripError::Cancelled)
    }

    fn advance(&self, tracker: &mut StateTracker, next: RoundTripState) {
        match tracker.transition(next) {
            Ok(()) => self.logger.debug(&format!("[Coordinator] State -> {}", next)),
            Err(e) => {
                self.logger.error(&format!("[Coordinator] {}", e));
                debug_assert!(false, "{}", e);
            }
        }
    }
}

/// Parse and strictly validate a structured final answer
fn validate_payload(schema: &Schema, text: &str) -> RoundTripResult<Value> {
    let failed = |errors| RoundTripError::SchemaValidationFailed {
        errors,
        payload: text.to_string(),
    };
    let value = parse_payload(text).map_err(|e| failed(vec![e]))?;
    SchemaValidator::strict(schema).validate(&value).map_err(failed)?;
    Ok(value)
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("provider", &self.provider.name())
            .field("model", &self.model.model)
            .field("options", &self.options)
            .field("tools", &self.tools.tool_count())
            .field("compactor", &self.compactor)
            .finish()
    }
}
