//! Tool dispatch errors

use thiserror::Error;

use crate::mcp::McpError;

/// Errors raised while resolving or invoking a tool
#[derive(Error, Debug)]
pub enum ToolError {
    /// Qualified name is missing its server or tool segment
    #[error("Malformed tool name '{0}': expected server.tool")]
    MalformedToolCall(String),

    /// Qualified name references a server that is not connected
    #[error("Unknown tool server: {0}")]
    UnknownServer(String),

    /// The remote call failed after reaching a known server
    #[error("Tool {server}.{tool} failed: {source}")]
    Execution {
        server: String,
        tool: String,
        #[source]
        source: McpError,
    },

    /// The remote call did not finish in time
    #[error("Tool {server}.{tool} timed out after {seconds}s")]
    Timeout {
        server: String,
        tool: String,
        seconds: u64,
    },
}

impl ToolError {
    /// Whether the loop skips the request instead of failing
    pub fn is_skippable(&self) -> bool {
        matches!(self, ToolError::MalformedToolCall(_) | ToolError::UnknownServer(_))
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = ToolError::Execution {
            server: "calc".to_string(),
            tool: "add".to_string(),
            source: McpError::ToolCallFailed("division by zero".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Tool calc.add failed: Tool call failed: division by zero"
        );
        assert!(!err.is_skippable());
        assert!(ToolError::UnknownServer("x".to_string()).is_skippable());
        assert!(ToolError::MalformedToolCall("x".to_string()).is_skippable());
    }
}
