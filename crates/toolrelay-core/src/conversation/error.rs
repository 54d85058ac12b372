//! Conversation errors

use serde_json::Value;
use thiserror::Error;

use crate::providers::ProviderError;
use crate::tools::ToolError;

/// Errors that end a conversation
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Tool-call round limit of {limit} exceeded")]
    RoundLimitExceeded { limit: u32 },

    #[error("Model did not answer within {seconds}s")]
    ModelTimeout { seconds: u64 },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Returned by `ask`, which cannot suspend
    #[error("Tool {tool} requires approval")]
    ApprovalRequired { tool: String, arguments: Value },
}

pub type ChatResult<T> = Result<T, ChatError>;
