//! Configuration provider trait

use async_trait::async_trait;

use super::settings::{RelayConfig, ServerConfig};

/// Configuration provider abstraction
///
/// Implementations:
/// - `MemoryConfigProvider`: In-memory for testing
/// - `FileConfigProvider`: YAML file (~/.config/toolrelay/config.yaml)
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Get the complete configuration
    async fn get_config(&self) -> ConfigResult<RelayConfig>;

    /// Get the configured tool servers (empty if the config cannot be read)
    async fn get_servers(&self) -> Vec<ServerConfig> {
        self.get_config()
            .await
            .map(|config| config.servers)
            .unwrap_or_default()
    }

    /// Add a new tool server
    async fn add_server(&self, server: ServerConfig) -> ConfigResult<()>;

    /// Remove a tool server by name
    async fn remove_server(&self, name: &str) -> ConfigResult<()>;
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    #[error("Server already exists: {0}")]
    ServerExists(String),

    #[error("Invalid server: {0}")]
    InvalidServer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Other(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Shared add rule for every provider: valid, unique name
pub(crate) fn check_new_server(existing: &[ServerConfig], server: &ServerConfig) -> ConfigResult<()> {
    if let Some(problem) = server.name_error() {
        return Err(ConfigError::InvalidServer(problem));
    }
    if existing.iter().any(|s| s.name == server.name) {
        return Err(ConfigError::ServerExists(server.name.clone()));
    }
    Ok(())
}
