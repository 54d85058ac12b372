//! Configuration data types
//!
//! Everything here deserializes from the YAML configuration file with
//! sensible defaults, so an empty file is a valid configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::providers::ProviderModelConfig;
use crate::types::QUALIFIED_SEPARATOR;

/// Complete relay configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Model used for every conversation
    #[serde(default)]
    pub model: ModelSettings,

    /// Tool servers to connect to
    #[serde(default)]
    pub servers: Vec<ServerConfig>,

    /// Conversation loop limits and policies
    #[serde(default)]
    pub limits: LoopSettings,

    /// Replaces the built-in system prompt
    #[serde(default, rename = "systemPrompt", skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Location of the approval preference file
    #[serde(default, rename = "approvalsPath", skip_serializing_if = "Option::is_none")]
    pub approvals_path: Option<PathBuf>,
}

impl RelayConfig {
    /// Find a server by name
    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|s| s.name == name)
    }
}

/// Which model to talk to and how to authenticate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Provider id (ollama, openai, anthropic, gemini, azure, openrouter, ...)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier as used by the provider's API
    #[serde(default = "default_model")]
    pub model: String,

    /// Custom API base URL
    #[serde(default, rename = "apiBase", skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Literal API key (prefer `api_key_env`)
    #[serde(default, rename = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default, rename = "apiKeyEnv", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_base: None,
            api_key: None,
            api_key_env: None,
        }
    }
}

impl ModelSettings {
    /// API key from the config, falling back to the configured env var
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.is_empty())
    }

    /// Request-level model configuration for the provider
    pub fn to_model_config(&self) -> ProviderModelConfig {
        let mut config = ProviderModelConfig::new(self.model.clone());
        if let Some(key) = self.resolve_api_key() {
            config = config.with_api_key(key);
        }
        if let Some(base) = &self.api_base {
            config = config.with_api_base(base.clone());
        }
        config
    }
}

/// A tool server descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name the server's tools are qualified with
    pub name: String,

    /// Streamable HTTP endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Unix socket path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<PathBuf>,

    /// Disabled servers are kept in the file but never connected
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// How to reach a tool server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEndpoint {
    Http(String),
    Unix(PathBuf),
}

impl std::fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerEndpoint::Http(url) => write!(f, "{}", url),
            ServerEndpoint::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

impl ServerConfig {
    /// Server reached over Streamable HTTP
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
            socket: None,
            enabled: true,
        }
    }

    /// Server reached over a Unix socket
    pub fn unix(name: impl Into<String>, socket: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            url: None,
            socket: Some(socket.into()),
            enabled: true,
        }
    }

    /// Mark the server disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Endpoint to connect to; a URL wins over a socket
    pub fn endpoint(&self) -> Option<ServerEndpoint> {
        if let Some(url) = self.url.as_ref().filter(|u| !u.trim().is_empty()) {
            return Some(ServerEndpoint::Http(url.trim().to_string()));
        }
        self.socket.clone().map(ServerEndpoint::Unix)
    }

    /// Problem with the name, if any
    pub fn name_error(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            Some("server name is empty".to_string())
        } else if self.name.contains(QUALIFIED_SEPARATOR) {
            Some(format!(
                "server name '{}' must not contain '{}'",
                self.name, QUALIFIED_SEPARATOR
            ))
        } else {
            None
        }
    }
}

/// What to do when a tool call fails after reaching its server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolErrorPolicy {
    /// Abort the conversation with the error
    #[default]
    Abort,
    /// Fold the error text into the tool message and keep going
    Report,
}

/// How schema violations in tool arguments are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentValidation {
    /// No validation
    Off,
    /// Log violations and dispatch anyway
    #[default]
    Warn,
    /// Do not dispatch; tell the model what was wrong
    Reject,
}

/// Conversation loop limits and policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSettings {
    /// Maximum tool-call rounds per conversation
    #[serde(default = "default_max_rounds", rename = "maxRounds")]
    pub max_rounds: u32,

    /// Per tool call timeout
    #[serde(default = "default_tool_timeout", rename = "toolTimeoutSecs")]
    pub tool_timeout_secs: u64,

    /// Per model call timeout
    #[serde(default = "default_model_timeout", rename = "modelTimeoutSecs")]
    pub model_timeout_secs: u64,

    #[serde(default, rename = "onToolError")]
    pub on_tool_error: ToolErrorPolicy,

    #[serde(default, rename = "argumentValidation")]
    pub argument_validation: ArgumentValidation,
}

fn default_max_rounds() -> u32 {
    10
}

fn default_tool_timeout() -> u64 {
    60
}

fn default_model_timeout() -> u64 {
    120
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            tool_timeout_secs: default_tool_timeout(),
            model_timeout_secs: default_model_timeout(),
            on_tool_error: ToolErrorPolicy::default(),
            argument_validation: ArgumentValidation::default(),
        }
    }
}

impl LoopSettings {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_tool_error_policy(mut self, policy: ToolErrorPolicy) -> Self {
        self.on_tool_error = policy;
        self
    }

    pub fn with_argument_validation(mut self, validation: ArgumentValidation) -> Self {
        self.argument_validation = validation;
        self
    }
}
