//! toolrelay Core
//!
//! Runtime-agnostic tool-calling orchestration. A language model answers a
//! user message while calling tools hosted on any number of MCP servers.
//! The crate can be driven from any front-end (the `toolrelay` CLI, an HTTP
//! service, tests).
//!
//! ## Conversation loop
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolrelay_core::{ConversationLoop, ToolDirectory, ChatOutcome, ApprovalDecision};
//!
//! let directory = Arc::new(ToolDirectory::new(logger.clone()));
//! directory.connect(&config.servers).await;
//!
//! let relay = ConversationLoop::new(provider, config.model.to_model_config(), directory, logger)
//!     .with_approvals(approvals)
//!     .with_settings(config.limits.clone());
//!
//! match relay.start_conversation("What's the weather in Oslo?").await? {
//!     ChatOutcome::Answer(text) => println!("{text}"),
//!     ChatOutcome::ApprovalRequired(pending) => {
//!         let outcome = relay.resume(pending, ApprovalDecision::Approve).await?;
//!     }
//! }
//! ```

pub mod approval;
pub mod config;
pub mod conversation;
pub mod logging;
pub mod mcp;
pub mod providers;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use types::{
    ChatMessage, InputSchema, MessageRole, QualifiedName, Tool, ToolCall, ToolContent,
    ToolDescriptor, ToolOutput,
};

pub use conversation::{
    ApprovalDecision, ChatError, ChatOutcome, ChatResult, Conversation, ConversationLoop,
    PendingApproval,
};

pub use tools::{
    normalize_arguments, sanitize_arguments, StaticToolServer, ToolDirectory, ToolError,
    ToolServer,
};

pub use approval::{ApprovalStore, FileApprovalStore, MemoryApprovalStore};

pub use logging::{ConsoleLogger, Logger, NoOpLogger};

pub use config::{ConfigProvider, FileConfigProvider, MemoryConfigProvider, RelayConfig};

pub use providers::{create_provider, GenaiProvider, MockProvider, Provider};

// MCP client using official rmcp SDK
pub use mcp::{McpClient, McpError, McpResult};
