//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::settings::{RelayConfig, ServerConfig};
use super::traits::{check_new_server, ConfigError, ConfigProvider, ConfigResult};

/// In-memory configuration provider for testing
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    config: RwLock<RelayConfig>,
}

impl MemoryConfigProvider {
    /// Create a provider holding the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with an initial configuration
    pub fn with_config(config: RelayConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Replace the configuration (useful for testing)
    pub fn set_config(&self, config: RelayConfig) {
        *self.config.write() = config;
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn get_config(&self) -> ConfigResult<RelayConfig> {
        Ok(self.config.read().clone())
    }

    async fn add_server(&self, server: ServerConfig) -> ConfigResult<()> {
        let mut config = self.config.write();
        check_new_server(&config.servers, &server)?;
        config.servers.push(server);
        Ok(())
    }

    async fn remove_server(&self, name: &str) -> ConfigResult<()> {
        let mut config = self.config.write();
        let original_len = config.servers.len();
        config.servers.retain(|s| s.name != name);

        if config.servers.len() == original_len {
            Err(ConfigError::ServerNotFound(name.to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_config_provider() {
        let config = MemoryConfigProvider::new();

        // Initially no servers
        assert!(config.get_servers().await.is_empty());

        config
            .add_server(ServerConfig::http("weather", "http://localhost:8080/mcp"))
            .await
            .unwrap();
        assert_eq!(config.get_servers().await.len(), 1);

        // Can't add duplicate
        assert!(matches!(
            config.add_server(ServerConfig::http("weather", "http://other")).await,
            Err(ConfigError::ServerExists(_))
        ));

        // Can't add a name that would break qualified names
        assert!(matches!(
            config.add_server(ServerConfig::http("a.b", "http://other")).await,
            Err(ConfigError::InvalidServer(_))
        ));

        config.remove_server("weather").await.unwrap();
        assert!(config.get_servers().await.is_empty());

        assert!(matches!(
            config.remove_server("weather").await,
            Err(ConfigError::ServerNotFound(_))
        ));
    }
}
