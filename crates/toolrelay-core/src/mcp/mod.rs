//! MCP (Model Context Protocol) client module
//!
//! Uses the official rmcp SDK to connect to MCP servers.
//! Supports Unix socket and Streamable HTTP transports.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolrelay_core::mcp::McpClient;
//! use toolrelay_core::tools::ToolServer;
//!
//! let client = McpClient::connect_http("weather", "http://localhost:8080/mcp", logger).await?;
//! let tools = client.list_tools().await?;
//! let result = client.call_tool("forecast", json!({"city": "Oslo"})).await?;
//! ```

mod client;

pub use client::{McpClient, McpConnector, McpError, McpResult};
