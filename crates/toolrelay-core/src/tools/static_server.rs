//! In-process tool server
//!
//! Serves a fixed set of tools backed by Rust closures. Used for tests and
//! for embedding local tools next to remote MCP servers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::server::{ServerTool, ToolServer};
use crate::mcp::{McpError, McpResult};
use crate::types::ToolOutput;

type Handler = Arc<dyn Fn(Value) -> McpResult<ToolOutput> + Send + Sync>;

/// A tool server whose tools are closures
#[derive(Default)]
pub struct StaticToolServer {
    tools: Vec<ServerTool>,
    handlers: BTreeMap<String, Handler>,
    /// Listing fails with this message when set
    listing_error: Option<String>,
    /// Every call sleeps this long before running
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, Value)>>,
    closed: AtomicBool,
}

impl StaticToolServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool with its handler
    pub fn with_tool<F>(mut self, tool: ServerTool, handler: F) -> Self
    where
        F: Fn(Value) -> McpResult<ToolOutput> + Send + Sync + 'static,
    {
        self.handlers.insert(tool.name.clone(), Arc::new(handler));
        self.tools.push(tool);
        self
    }

    /// Add a schema-less tool that always answers with `text`
    pub fn with_text_tool(self, name: &str, description: &str, text: &str) -> Self {
        let text = text.to_string();
        self.with_tool(
            ServerTool::new(name, description, json!({"type": "object"})),
            move |_| Ok(ToolOutput::text(text.clone())),
        )
    }

    /// Make `list_tools` fail
    pub fn failing_listing(mut self, message: impl Into<String>) -> Self {
        self.listing_error = Some(message.into());
        self
    }

    /// Delay every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls received so far, as (tool, arguments)
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolServer for StaticToolServer {
    async fn list_tools(&self) -> McpResult<Vec<ServerTool>> {
        match &self.listing_error {
            Some(message) => Err(McpError::Protocol(message.clone())),
            None => Ok(self.tools.clone()),
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput> {
        self.calls.lock().push((name.to_string(), arguments.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| McpError::ToolCallFailed(format!("unknown tool: {}", name)))?;
        handler(arguments)
    }

    async fn close(&self) -> McpResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
