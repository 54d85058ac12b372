//! Core traits and types for approval preferences

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether one tool needs a human confirmation before it runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    #[serde(rename = "serverName")]
    pub server_name: String,
    #[serde(rename = "toolName")]
    pub tool_name: String,
    #[serde(rename = "requiresApproval")]
    pub requires_approval: bool,
}

impl ApprovalRecord {
    pub fn new(server_name: impl Into<String>, tool_name: impl Into<String>, requires_approval: bool) -> Self {
        Self {
            server_name: server_name.into(),
            tool_name: tool_name.into(),
            requires_approval,
        }
    }
}

/// Errors that can occur during approval store operations
#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Approval store error: {0}")]
    Other(String),
}

pub type ApprovalResult<T> = Result<T, ApprovalError>;

/// Per (server, tool) approval preferences
///
/// Implementations:
/// - `MemoryApprovalStore`: in-memory, for tests and embedding
/// - `FileApprovalStore`: YAML file on disk
///
/// A tool without a record does not require approval.
pub trait ApprovalStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Whether calls to `server.tool` must be confirmed first
    fn requires_approval(&self, server_name: &str, tool_name: &str) -> ApprovalResult<bool>;

    /// Set the preference for one tool
    fn set(&self, server_name: &str, tool_name: &str, requires_approval: bool) -> ApprovalResult<()>;

    /// Remove the preference for one tool (back to the default)
    fn delete(&self, server_name: &str, tool_name: &str) -> ApprovalResult<()>;

    /// All stored preferences, ordered by server then tool
    fn list(&self) -> ApprovalResult<Vec<ApprovalRecord>>;
}
