//! Tool servers and the directory that routes calls to them
//!
//! ```text
//!   ConversationLoop
//!         │  server.tool + arguments
//!         ▼
//!   ToolDirectory ──► "weather" ─► McpClient (HTTP)
//!                 ──► "files"   ─► McpClient (Unix socket)
//!                 ──► "local"   ─► StaticToolServer
//! ```

mod directory;
mod error;
pub mod sanitize;
mod server;
mod static_server;

pub use directory::{ToolDirectory, DEFAULT_CALL_TIMEOUT};
pub use error::{ToolError, ToolResult};
pub use sanitize::{normalize_arguments, sanitize_arguments};
pub use server::{ServerConnector, ServerTool, ToolServer};
pub use static_server::StaticToolServer;
