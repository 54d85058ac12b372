//! Adapter between toolrelay types and genai types
//!
//! Conversion functions between our messages and genai's, plus the client
//! factory that wires in our auth and endpoint resolution.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatRole as GenaiRole, ContentPart,
    MessageContent, Tool as GenaiTool, ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::json;

use crate::types::{ChatMessage, MessageRole, Tool, ToolCall};

use super::error::ProviderResult;
use super::traits::{ChatOptions, ProviderModelConfig};

// ============================================================================
// Message Conversion: toolrelay -> genai
// ============================================================================

/// Convert a MessageRole to genai ChatRole
pub fn to_genai_role(role: MessageRole) -> GenaiRole {
    match role {
        MessageRole::System => GenaiRole::System,
        MessageRole::User => GenaiRole::User,
        MessageRole::Assistant => GenaiRole::Assistant,
        MessageRole::Tool => GenaiRole::Tool,
    }
}

/// Convert a ToolCall to genai ToolCall
pub fn to_genai_tool_call(call: &ToolCall) -> ProviderResult<GenaiToolCall> {
    // Built through serde so fields genai adds later keep their defaults
    Ok(serde_json::from_value(json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": call.arguments,
    }))?)
}

/// Convert a ChatMessage to genai ChatMessage
///
/// Assistant messages carrying tool calls become genai tool-call messages,
/// with any text the model sent alongside kept as a leading text part;
/// tool messages become tool responses keyed by the call id.
pub fn to_genai_message(msg: ChatMessage) -> ProviderResult<GenaiMessage> {
    let message = match msg.role {
        MessageRole::System => GenaiMessage::system(msg.content),
        MessageRole::User => GenaiMessage::user(msg.content),
        MessageRole::Assistant if msg.has_tool_calls() => {
            let calls = msg
                .tool_calls
                .iter()
                .map(to_genai_tool_call)
                .collect::<ProviderResult<Vec<_>>>()?;
            if msg.content.is_empty() {
                GenaiMessage::from(calls)
            } else {
                let mut parts = vec![ContentPart::from_text(msg.content)];
                parts.extend(calls.into_iter().map(ContentPart::ToolCall));
                GenaiMessage::assistant(MessageContent::from_parts(parts))
            }
        }
        MessageRole::Assistant => GenaiMessage::assistant(msg.content),
        MessageRole::Tool => {
            let call_id = msg.tool_call_id.unwrap_or_default();
            GenaiMessage::from(GenaiToolResponse::new(call_id, msg.content))
        }
    };
    Ok(message)
}

/// Convert a vector of messages to genai messages
pub fn to_genai_messages(messages: Vec<ChatMessage>) -> ProviderResult<Vec<GenaiMessage>> {
    messages.into_iter().map(to_genai_message).collect()
}

// ============================================================================
// Tool Conversion: toolrelay -> genai
// ============================================================================

/// Convert a Tool signature to genai Tool
pub fn to_genai_tool(tool: Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_description(&tool.description);

    if let Some(schema) = tool.input_schema {
        genai_tool = genai_tool.with_schema(schema);
    }

    genai_tool
}

/// Convert tool signatures to genai tools
pub fn to_genai_tools(tools: Vec<Tool>) -> Vec<GenaiTool> {
    tools.into_iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: toolrelay -> genai
// ============================================================================

/// Convert ChatOptions to genai ChatOptions
pub fn to_genai_options(options: &ChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    // Tool calls arrive on the stream end event only when captured
    genai_opts.with_capture_tool_calls(true)
}

// ============================================================================
// Response Conversion: genai -> toolrelay
// ============================================================================

/// Convert genai ToolCall to ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall::new(tc.call_id.clone(), tc.fn_name.clone(), tc.fn_arguments.clone())
}

// ============================================================================
// Provider Resolution
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

impl ProviderConfig {
    pub fn new(provider: impl Into<String>, model: &ProviderModelConfig) -> Self {
        Self {
            provider: provider.into(),
            api_key: model.api_key.clone(),
            api_base: model.api_base.clone(),
        }
    }
}

fn owned_endpoint(base: &Option<String>) -> Option<Endpoint> {
    base.as_ref().map(|u| Endpoint::from_owned(u.clone()))
}

/// Create a genai Client with our auth and endpoint resolution
///
/// An explicit API key wins; without one genai falls back to its own
/// environment lookup for the adapter.
pub fn create_client(config: &ProviderConfig) -> Client {
    let auth_explicit_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let explicit_key = auth_explicit_key.clone();
            Box::pin(async move { Ok(explicit_key.map(AuthData::from_single)) })
        },
    );

    let target_provider = config.provider.to_lowercase();
    let target_api_base = config.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let ServiceTarget { ref model, .. } = target;

            let (endpoint, adapter_kind): (Option<Endpoint>, AdapterKind) = match target_provider.as_str() {
                // OpenAI-compatible providers
                "azure" => (
                    owned_endpoint(&target_api_base)
                        .or_else(|| Some(Endpoint::from_static("https://your-resource.openai.azure.com/"))),
                    AdapterKind::OpenAI,
                ),
                "openrouter" => (
                    Some(Endpoint::from_static("https://openrouter.ai/api/v1/")),
                    AdapterKind::OpenAI,
                ),
                "mistral" => (
                    Some(Endpoint::from_static("https://api.mistral.ai/v1/")),
                    AdapterKind::OpenAI,
                ),
                "redhat" | "rhel" | "rhai" | "openai-compatible" => {
                    (owned_endpoint(&target_api_base), AdapterKind::OpenAI)
                }
                // Native genai providers, optionally at a custom base (remote ollama)
                _ => match owned_endpoint(&target_api_base) {
                    Some(endpoint) => (Some(endpoint), model.adapter_kind),
                    None => return Ok(target),
                },
            };

            let resolved_endpoint = endpoint.unwrap_or(target.endpoint);
            let resolved_model = ModelIden::new(adapter_kind, model.model_name.clone());

            Ok(ServiceTarget {
                endpoint: resolved_endpoint,
                auth: target.auth,
                model: resolved_model,
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
            "azure" | "openrouter" | "mistral" | "redhat" | "rhel" | "rhai" | "openai-compatible"
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_conversion() {
        assert!(matches!(to_genai_role(MessageRole::System), GenaiRole::System));
        assert!(matches!(to_genai_role(MessageRole::User), GenaiRole::User));
        assert!(matches!(to_genai_role(MessageRole::Assistant), GenaiRole::Assistant));
        assert!(matches!(to_genai_role(MessageRole::Tool), GenaiRole::Tool));
    }

    #[test]
    fn test_message_conversion() {
        let msg = to_genai_message(ChatMessage::user("Hello, world!")).unwrap();
        assert!(matches!(msg.role, GenaiRole::User));

        let call = ToolCall::new("call_0", "weather.search", json!({"q": "Oslo"}));
        let asst = ChatMessage::assistant_with_tools("", vec![call.clone()]);
        let msg = to_genai_message(asst).unwrap();
        assert!(matches!(msg.role, GenaiRole::Assistant));

        let msg = to_genai_message(ChatMessage::tool(&call, "rainy")).unwrap();
        assert!(matches!(msg.role, GenaiRole::Tool));
    }

    #[test]
    fn test_assistant_text_kept_with_tool_calls() {
        let call = ToolCall::new("call_1", "weather.search", json!({"q": "Oslo"}));
        let asst = ChatMessage::assistant_with_tools("Let me check the weather.", vec![call]);

        let msg = to_genai_message(asst).unwrap();
        assert!(matches!(msg.role, GenaiRole::Assistant));
        assert_eq!(msg.content.first_text(), Some("Let me check the weather."));
        let calls = msg.content.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].fn_name, "weather.search");
    }

    #[test]
    fn test_tool_call_conversion() {
        let call = ToolCall::new("call_7", "calc.add", json!({"a": 2, "b": 3}));
        let genai_call = to_genai_tool_call(&call).unwrap();
        assert_eq!(genai_call.call_id, "call_7");
        assert_eq!(genai_call.fn_name, "calc.add");

        assert_eq!(from_genai_tool_call(&genai_call), call);
    }

    #[test]
    fn test_tool_conversion() {
        let tool = Tool::new("weather.search", "Get weather for a location")
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string" }
                }
            }));

        let genai_tool = to_genai_tool(tool);
        assert_eq!(genai_tool.name, "weather.search");
    }

    #[test]
    fn test_provider_detection() {
        assert!(is_genai_native("openai"));
        assert!(is_genai_native("Ollama"));
        assert!(!is_genai_native("azure"));

        assert!(is_genai_supported("azure"));
        assert!(is_genai_supported("openrouter"));
        assert!(is_genai_supported("openai-compatible"));
        assert!(!is_genai_supported("unknown_provider"));
    }
}
