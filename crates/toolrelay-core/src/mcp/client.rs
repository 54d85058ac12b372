//! MCP Client using the official rmcp SDK
//!
//! Connects to MCP servers over Streamable HTTP or a Unix socket and exposes
//! them through the `ToolServer` trait.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool,
    },
    service::{Peer, RunningService},
    RoleClient, ServiceExt,
};
use serde_json::Value;
use thiserror::Error;

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::config::{ServerConfig, ServerEndpoint};
use crate::logging::Logger;
use crate::tools::{ServerConnector, ServerTool, ToolServer};
use crate::types::{ToolContent, ToolOutput};

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),
}

pub type McpResult<T> = Result<T, McpError>;

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolrelay".to_string(),
            title: Some("toolrelay".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// MCP client for one tool server
pub struct McpClient {
    /// Name the server is registered under (for logs)
    server_name: String,
    /// Request handle, shareable across concurrent calls
    peer: Peer<RoleClient>,
    /// The running service; taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    fn from_service(
        server_name: &str,
        service: RunningService<RoleClient, ClientInfo>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let client = Self {
            server_name: server_name.to_string(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            logger,
        };
        match client.server_info() {
            Some(info) => client.logger.info(&format!(
                "[McpClient] '{}' connected to {} {}",
                server_name, info.name, info.version
            )),
            None => client
                .logger
                .info(&format!("[McpClient] '{}' connected and initialized", server_name)),
        }
        client
    }

    /// Connect to an MCP server over a Unix socket
    #[cfg(unix)]
    pub async fn connect_unix<P: AsRef<Path>>(
        server_name: &str,
        socket_path: P,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        let path = socket_path.as_ref();
        logger.info(&format!(
            "[McpClient] Connecting '{}' to Unix socket: {:?}",
            server_name, path
        ));

        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let service = client_info()
            .serve(stream)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(server_name, service, logger))
    }

    /// Unix sockets are not available on this platform
    #[cfg(not(unix))]
    pub async fn connect_unix<P: AsRef<Path>>(
        _server_name: &str,
        socket_path: P,
        _logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        Err(McpError::UnsupportedTransport(format!(
            "unix socket {:?}",
            socket_path.as_ref()
        )))
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(
        server_name: &str,
        url: &str,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        logger.info(&format!("[McpClient] Connecting '{}' to HTTP: {}", server_name, url));

        let transport = StreamableHttpClientTransport::from_uri(url);

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(server_name, service, logger))
    }

    /// Connect to whatever endpoint the descriptor names
    pub async fn connect(
        server_name: &str,
        endpoint: &ServerEndpoint,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        match endpoint {
            ServerEndpoint::Http(url) => Self::connect_http(server_name, url, logger).await,
            ServerEndpoint::Unix(path) => Self::connect_unix(server_name, path, logger).await,
        }
    }

    /// Get server info
    pub fn server_info(&self) -> Option<Implementation> {
        self.peer.peer_info().map(|info| info.server_info.clone())
    }
}

impl From<Tool> for ServerTool {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|s| s.to_string()).unwrap_or_default(),
            // input_schema is Arc<JsonObject>
            input_schema: Value::Object(tool.input_schema.as_ref().clone()),
        }
    }
}

impl From<CallToolResult> for ToolOutput {
    fn from(result: CallToolResult) -> Self {
        if result.content.is_empty() {
            if let Some(structured) = result.structured_content {
                return ToolOutput::Value(structured);
            }
        }

        let parts = result
            .content
            .into_iter()
            .map(|c| match c.raw {
                RawContent::Text(t) => ToolContent::Text { text: t.text },
                other => ToolContent::Other(serde_json::to_value(&other).unwrap_or(Value::Null)),
            })
            .collect();
        ToolOutput::Content(parts)
    }
}

#[async_trait]
impl ToolServer for McpClient {
    async fn list_tools(&self) -> McpResult<Vec<ServerTool>> {
        // Follows next_cursor until the server has no more pages
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.debug(&format!(
            "[McpClient] '{}' listed {} tools",
            self.server_name,
            tools.len()
        ));

        Ok(tools.into_iter().map(ServerTool::from).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput> {
        self.logger.debug(&format!(
            "[McpClient] '{}' calling tool: {}",
            self.server_name, name
        ));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        if result.is_error.unwrap_or(false) {
            self.logger.warn(&format!(
                "[McpClient] '{}' tool {} reported an error result",
                self.server_name, name
            ));
        }

        Ok(result.into())
    }

    async fn close(&self) -> McpResult<()> {
        let service = self.service.lock().take();
        if let Some(service) = service {
            self.logger.info(&format!("[McpClient] Closing '{}'", self.server_name));
            service
                .cancel()
                .await
                .map_err(|e| McpError::Protocol(e.to_string()))?;
        }
        Ok(())
    }
}

/// Connects descriptors with `McpClient`
pub struct McpConnector {
    logger: Arc<dyn Logger>,
}

impl McpConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl ServerConnector for McpConnector {
    async fn connect(
        &self,
        server: &ServerConfig,
        endpoint: &ServerEndpoint,
    ) -> McpResult<Arc<dyn ToolServer>> {
        let client = McpClient::connect(&server.name, endpoint, Arc::clone(&self.logger)).await?;
        Ok(Arc::new(client))
    }
}
