//! The seam between the directory and individual tool servers

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ServerConfig, ServerEndpoint};
use crate::mcp::McpResult;
use crate::types::ToolOutput;

/// A tool as reported by its server (unqualified)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

impl ServerTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A session with one tool server
///
/// Implementations must allow concurrent calls through `&self`.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// List the tools the server currently exposes
    async fn list_tools(&self) -> McpResult<Vec<ServerTool>>;

    /// Call a tool by its unqualified name
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput>;

    /// Release the session; calling it twice is harmless
    async fn close(&self) -> McpResult<()> {
        Ok(())
    }
}

/// Opens sessions for server descriptors
#[async_trait]
pub trait ServerConnector: Send + Sync {
    async fn connect(
        &self,
        server: &ServerConfig,
        endpoint: &ServerEndpoint,
    ) -> McpResult<Arc<dyn ToolServer>>;
}
