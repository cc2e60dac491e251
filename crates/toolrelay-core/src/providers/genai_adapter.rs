//! Adapter between toolrelay types and genai types
//!
//! This module provides conversion functions between our types and genai's
//! types, plus client construction. Auth flows through our `SecretStore`,
//! not genai's default env var lookup.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatResponseFormat,
    JsonSpec, Tool as GenaiTool, ToolCall as GenaiToolCall,
    ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::json;

use crate::secrets::SecretStore;
use crate::types::{ChatMessage, ContentPart, MessageContent, MessageRole, Tool, ToolCall};

use super::error::ProviderResult;
use super::traits::CompletionOptions;

// ============================================================================
// Message Conversion: toolrelay -> genai
// ============================================================================

fn text_message(role: MessageRole, text: String) -> GenaiMessage {
    match role {
        MessageRole::System => GenaiMessage::system(text),
        MessageRole::Assistant => GenaiMessage::assistant(text),
        MessageRole::User | MessageRole::Tool => GenaiMessage::user(text),
    }
}

/// Convert a tool call to genai's ToolCall
///
/// Goes through serde so fields genai adds later keep their defaults.
pub fn to_genai_tool_call(call: &ToolCall) -> ProviderResult<GenaiToolCall> {
    let value = json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": call.input,
    });
    Ok(serde_json::from_value(value)?)
}

/// Convert one conversation turn to one or more genai messages
///
/// An assistant turn with tool uses becomes a native tool-call message and
/// each tool result becomes a native tool-response message.
pub fn to_genai_message(msg: ChatMessage) -> ProviderResult<Vec<GenaiMessage>> {
    let parts = match msg.content {
        MessageContent::Text(text) => return Ok(vec![text_message(msg.role, text)]),
        MessageContent::Parts(parts) => parts,
    };

    let mut out = Vec::new();
    let mut text = Vec::new();
    let mut calls = Vec::new();

    for part in parts {
        match part {
            ContentPart::Text { text: t } => text.push(t),
            ContentPart::ToolUse { id, name, input } => {
                calls.push(to_genai_tool_call(&ToolCall::new(id, name, input))?);
            }
            ContentPart::ToolResult { tool_use_id, content, .. } => {
                out.push(GenaiMessage::from(GenaiToolResponse::new(tool_use_id, content)));
            }
        }
    }

    if !text.is_empty() {
        out.insert(0, text_message(msg.role, text.join("\n")));
    }
    if !calls.is_empty() {
        out.push(GenaiMessage::from(calls));
    }
    Ok(out)
}

/// Convert a conversation to genai messages
pub fn to_genai_messages(messages: Vec<ChatMessage>) -> ProviderResult<Vec<GenaiMessage>> {
    let mut out = Vec::with_capacity(messages.len());
    for msg in messages {
        out.extend(to_genai_message(msg)?);
    }
    Ok(out)
}

// ============================================================================
// Tool Conversion: toolrelay -> genai
// ============================================================================

/// Convert a tool definition to genai's Tool
pub fn to_genai_tool(tool: Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_description(&tool.description);

    if let Some(schema) = tool.input_schema {
        genai_tool = genai_tool.with_schema(schema);
    }

    genai_tool
}

/// Convert tool definitions to genai tools
pub fn to_genai_tools(tools: Vec<Tool>) -> Vec<GenaiTool> {
    tools.into_iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: toolrelay -> genai
// ============================================================================

/// Convert completion options to genai ChatOptions
pub fn to_genai_options(options: &CompletionOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    if let Some(schema) = &options.output_schema {
        let spec = JsonSpec::new(schema.name.clone(), schema.to_json_schema());
        genai_opts = genai_opts.with_response_format(ChatResponseFormat::JsonSpec(spec));
    }

    // Capture tool calls in stream so we can return them
    genai_opts = genai_opts.with_capture_tool_calls(true);

    genai_opts
}

// ============================================================================
// Response Conversion: genai -> toolrelay
// ============================================================================

/// Convert genai ToolCall to our ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall {
        id: tc.call_id.clone(),
        name: tc.fn_name.clone(),
        input: tc.fn_arguments.clone(),
    }
}

// ============================================================================
// Client Creation with Custom Auth
// ============================================================================

/// Provider configuration for routing
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier (e.g., "openai", "azure", "openrouter")
    pub provider: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

/// Map a genai AdapterKind to the secret store key for it
pub fn adapter_kind_to_secret_key(adapter: AdapterKind) -> String {
    match adapter {
        AdapterKind::OpenAI => "openai".to_string(),
        AdapterKind::Anthropic => "anthropic".to_string(),
        AdapterKind::Gemini => "gemini".to_string(),
        AdapterKind::Ollama => "ollama".to_string(),
        _ => format!("{:?}", adapter).to_lowercase(),
    }
}

/// Create a genai Client with custom auth and endpoint resolution
pub fn create_client(config: &ProviderConfig, secrets: Arc<dyn SecretStore>) -> Client {
    let auth_provider = config.provider.clone();
    let auth_explicit_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let provider = auth_provider.clone();
            let explicit_key = auth_explicit_key.clone();
            let secrets = Arc::clone(&secrets);
            let adapter_kind = model_iden.adapter_kind;

            Box::pin(async move {
                if let Some(key) = explicit_key {
                    return Ok(Some(AuthData::from_single(key)));
                }

                let secret_key = if provider.is_empty() {
                    adapter_kind_to_secret_key(adapter_kind)
                } else {
                    provider
                };

                // None lets genai handle the "no auth" case (fine for Ollama)
                Ok(secrets.get(&secret_key).map(|key| AuthData::from_single(key)))
            })
        },
    );

    let target_provider = config.provider.clone();
    let target_api_base = config.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let endpoint = match target_provider.as_str() {
                "azure" => target_api_base
                    .as_ref()
                    .map(|u| Endpoint::from_owned(u.clone()))
                    .unwrap_or_else(|| Endpoint::from_static("https://your-resource.openai.azure.com/")),
                "openrouter" => Endpoint::from_static("https://openrouter.ai/api/v1/"),
                "mistral" => Endpoint::from_static("https://api.mistral.ai/v1/"),
                // Native genai providers resolve normally unless a base URL is pinned
                _ => match &target_api_base {
                    Some(base) => Endpoint::from_owned(base.clone()),
                    None => return Ok(target),
                },
            };

            let model = if is_genai_native(&target_provider) {
                target.model
            } else {
                ModelIden::new(AdapterKind::OpenAI, target.model.model_name.clone())
            };

            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}

/// Check if a provider is natively supported by genai
pub fn is_genai_native(provider: &str) -> bool {
    matches!(
        provider.to_lowercase().as_str(),
        "openai"
            | "anthropic"
            | "gemini"
            | "ollama"
            | "groq"
            | "xai"
            | "deepseek"
            | "cohere"
            | "fireworks"
            | "together"
    )
}

/// Check if a provider can be handled by genai (native or via OpenAI-compat)
pub fn is_genai_supported(provider: &str) -> bool {
    is_genai_native(provider)
        || matches!(
            provider.to_lowercase().as_str(),
            "azure" | "openrouter" | "mistral"
        )
}
