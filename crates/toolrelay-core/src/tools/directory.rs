//! Tool directory over several tool servers
//!
//! The directory owns one session per named server and is the only place
//! that knows how a qualified `server.tool` name maps to a session. Every
//! server is queried independently, so one broken server costs its own
//! tools and nothing more.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::Value;

use super::error::{ToolError, ToolResult};
use super::server::{ServerConnector, ServerTool, ToolServer};
use crate::config::ServerConfig;
use crate::logging::Logger;
use crate::{log_debug, log_info};
use crate::mcp::McpConnector;
use crate::types::{InputSchema, ToolDescriptor, ToolOutput};

/// Default limit for a single tool call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Registry of connected tool servers
pub struct ToolDirectory {
    /// Sessions by server name, ordered so listings are stable
    servers: RwLock<BTreeMap<String, Arc<dyn ToolServer>>>,
    call_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl ToolDirectory {
    /// Create an empty directory
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            servers: RwLock::new(BTreeMap::new()),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            logger,
        }
    }

    /// Set the per-call timeout
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Register an existing session under `name`.
    ///
    /// Returns false (and leaves the directory unchanged) when the name is
    /// already taken.
    pub fn register(&self, name: impl Into<String>, server: Arc<dyn ToolServer>) -> bool {
        let name = name.into();
        let mut servers = self.servers.write();
        if servers.contains_key(&name) {
            self.logger.warn(&format!(
                "[ToolDirectory] Server '{}' already registered, ignoring",
                name
            ));
            return false;
        }
        servers.insert(name, server);
        true
    }

    /// Connect every usable descriptor over MCP
    pub async fn connect(&self, descriptors: &[ServerConfig]) -> usize {
        let connector = McpConnector::new(Arc::clone(&self.logger));
        self.connect_with(&connector, descriptors).await
    }

    /// Connect every usable descriptor with `connector`.
    ///
    /// Returns the number of servers that ended up registered. Failures are
    /// logged per server.
    pub async fn connect_with(
        &self,
        connector: &dyn ServerConnector,
        descriptors: &[ServerConfig],
    ) -> usize {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut candidates = Vec::new();

        for server in descriptors {
            if !server.enabled {
                self.logger.info(&format!(
                    "[ToolDirectory] Skipping disabled server '{}'",
                    server.name
                ));
                continue;
            }
            if let Some(problem) = server.name_error() {
                self.logger.warn(&format!("[ToolDirectory] Skipping server: {}", problem));
                continue;
            }
            let Some(endpoint) = server.endpoint() else {
                self.logger.warn(&format!(
                    "[ToolDirectory] Skipping server '{}': no url or socket",
                    server.name
                ));
                continue;
            };
            if !seen.insert(server.name.as_str()) || self.is_connected(&server.name) {
                self.logger.warn(&format!(
                    "[ToolDirectory] Skipping duplicate server '{}'",
                    server.name
                ));
                continue;
            }
            candidates.push((server, endpoint));
        }

        let attempts = candidates.iter().map(|(server, endpoint)| async move {
            (server, endpoint, connector.connect(server, endpoint).await)
        });

        let mut connected = 0;
        for (server, endpoint, result) in join_all(attempts).await {
            match result {
                Ok(session) => {
                    if self.register(server.name.clone(), session) {
                        connected += 1;
                        self.logger.info(&format!(
                            "[ToolDirectory] Connected '{}' at {}",
                            server.name, endpoint
                        ));
                    }
                }
                Err(e) => {
                    self.logger.error(&format!(
                        "[ToolDirectory] Failed to connect '{}' at {}: {}",
                        server.name, endpoint, e
                    ));
                }
            }
        }
        connected
    }

    /// Session for `name`, cloned out of the lock
    fn session(&self, name: &str) -> Option<Arc<dyn ToolServer>> {
        self.servers.read().get(name).cloned()
    }

    fn sessions(&self) -> Vec<(String, Arc<dyn ToolServer>)> {
        self.servers
            .read()
            .iter()
            .map(|(name, server)| (name.clone(), Arc::clone(server)))
            .collect()
    }

    /// Tools of every connected server, ordered by server name.
    ///
    /// A server whose listing fails contributes nothing.
    pub async fn list_all_tools(&self) -> Vec<ToolDescriptor> {
        let sessions = self.sessions();
        let listings = sessions
            .iter()
            .map(|(name, server)| async move { (name, server.list_tools().await) });

        let mut descriptors = Vec::new();
        for (name, listing) in join_all(listings).await {
            match listing {
                Ok(tools) => {
                    let before = descriptors.len();
                    descriptors.extend(self.describe(name, tools));
                    log_debug!(
                        self.logger,
                        "[ToolDirectory] '{}' offers {} tools",
                        name,
                        descriptors.len() - before
                    );
                }
                Err(e) => {
                    self.logger.error(&format!(
                        "[ToolDirectory] Failed to list tools of '{}': {}",
                        name, e
                    ));
                }
            }
        }

        log_info!(
            self.logger,
            "[ToolDirectory] Discovered {} tools from {} servers",
            descriptors.len(),
            sessions.len()
        );
        descriptors
    }

    /// Turn a server listing into descriptors, keeping the first of any
    /// repeated tool name
    fn describe(&self, server_name: &str, tools: Vec<ServerTool>) -> Vec<ToolDescriptor> {
        let mut seen = HashSet::new();
        tools
            .into_iter()
            .filter(|tool| {
                let fresh = seen.insert(tool.name.clone());
                if !fresh {
                    self.logger.warn(&format!(
                        "[ToolDirectory] '{}' reports tool '{}' twice, keeping the first",
                        server_name, tool.name
                    ));
                }
                fresh
            })
            .map(|tool| ToolDescriptor {
                server_name: server_name.to_string(),
                tool_name: tool.name,
                description: tool.description,
                input_schema: InputSchema::from_value(&tool.input_schema),
            })
            .collect()
    }

    /// Fresh descriptor for one tool, if the server is connected and has it
    pub async fn lookup_tool(&self, server_name: &str, tool_name: &str) -> Option<ToolDescriptor> {
        let session = self.session(server_name)?;
        match session.list_tools().await {
            Ok(tools) => self
                .describe(server_name, tools)
                .into_iter()
                .find(|d| d.tool_name == tool_name),
            Err(e) => {
                self.logger.warn(&format!(
                    "[ToolDirectory] Lookup of {}.{} failed: {}",
                    server_name, tool_name, e
                ));
                None
            }
        }
    }

    /// Call one tool. Never retried.
    pub async fn invoke(
        &self,
        server_name: &str,
        tool_name: &str,
        arguments: Value,
    ) -> ToolResult<ToolOutput> {
        let session = self
            .session(server_name)
            .ok_or_else(|| ToolError::UnknownServer(server_name.to_string()))?;

        self.logger.debug(&format!(
            "[ToolDirectory] Invoking {}.{}",
            server_name, tool_name
        ));

        match tokio::time::timeout(self.call_timeout, session.call_tool(tool_name, arguments)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(ToolError::Execution {
                server: server_name.to_string(),
                tool: tool_name.to_string(),
                source,
            }),
            Err(_) => Err(ToolError::Timeout {
                server: server_name.to_string(),
                tool: tool_name.to_string(),
                seconds: self.call_timeout.as_secs(),
            }),
        }
    }

    /// Close and forget every session. Safe to call repeatedly.
    pub async fn disconnect_all(&self) {
        let servers = std::mem::take(&mut *self.servers.write());
        for (name, server) in servers {
            if let Err(e) = server.close().await {
                self.logger.warn(&format!(
                    "[ToolDirectory] Error closing '{}': {}",
                    name, e
                ));
            }
        }
    }

    pub fn server_names(&self) -> Vec<String> {
        self.servers.read().keys().cloned().collect()
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.servers.read().contains_key(name)
    }

    pub fn server_count(&self) -> usize {
        self.servers.read().len()
    }
}
