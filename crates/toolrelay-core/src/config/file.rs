//! File-based configuration provider (YAML)
//!
//! The user-level file lives at `<config dir>/toolrelay/config.yaml`; any
//! other path can be used with `FileConfigProvider::new`.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::settings::{RelayConfig, ServerConfig};
use super::traits::{check_new_server, ConfigError, ConfigProvider, ConfigResult};

/// File-based configuration provider
///
/// Reads and writes configuration from a YAML file. A missing file is the
/// default configuration.
///
/// # Example
///
/// ```no_run
/// use toolrelay_core::config::FileConfigProvider;
///
/// let user_config = FileConfigProvider::user();
/// let explicit = FileConfigProvider::new("/etc/toolrelay/config.yaml");
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    cache: RwLock<Option<RelayConfig>>,
}

impl FileConfigProvider {
    /// Create a provider for a specific path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// User-level config (~/.config/toolrelay/config.yaml)
    pub fn user() -> Self {
        Self::new(Self::user_path())
    }

    /// Path of the user-level config file
    pub fn user_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("toolrelay").join("config.yaml")
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigResult<RelayConfig> {
        if !self.path.exists() {
            return Ok(RelayConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(RelayConfig::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn save(&self, config: &RelayConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config)?;
        fs::write(&self.path, content)?;

        *self.cache.write() = Some(config.clone());
        Ok(())
    }

    fn cached(&self) -> ConfigResult<RelayConfig> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }
        self.reload()
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<RelayConfig> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Write a complete configuration
    pub fn store(&self, config: &RelayConfig) -> ConfigResult<()> {
        self.save(config)
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn get_config(&self) -> ConfigResult<RelayConfig> {
        self.cached()
    }

    async fn add_server(&self, server: ServerConfig) -> ConfigResult<()> {
        let mut config = self.cached()?;
        check_new_server(&config.servers, &server)?;
        config.servers.push(server);
        self.save(&config)
    }

    async fn remove_server(&self, name: &str) -> ConfigResult<()> {
        let mut config = self.cached()?;
        let original_len = config.servers.len();
        config.servers.retain(|s| s.name != name);

        if config.servers.len() == original_len {
            Err(ConfigError::ServerNotFound(name.to_string()))
        } else {
            self.save(&config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_config_provider() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let provider = FileConfigProvider::new(&path);

        // Missing file is the default config
        assert!(!provider.exists());
        assert_eq!(provider.get_config().await.unwrap(), RelayConfig::default());

        provider
            .add_server(ServerConfig::http("weather", "http://localhost:8080/mcp"))
            .await
            .unwrap();
        assert!(provider.exists());

        // A fresh provider reads what was persisted
        let reread = FileConfigProvider::new(&path);
        let servers = reread.get_servers().await;
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name, "weather");

        reread.remove_server("weather").await.unwrap();
        assert!(provider.reload().unwrap().servers.is_empty());
    }

    #[tokio::test]
    async fn test_yaml_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let provider = FileConfigProvider::new(&path);

        provider
            .add_server(ServerConfig::unix("files", "/tmp/files.sock"))
            .await
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("files"));
        assert!(content.contains("/tmp/files.sock"));
        assert!(content.contains("maxRounds"));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "servers: [unterminated").unwrap();

        let provider = FileConfigProvider::new(&path);
        assert!(matches!(provider.get_config().await, Err(ConfigError::Yaml(_))));
        assert!(provider.get_servers().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_is_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "").unwrap();

        let provider = FileConfigProvider::new(&path);
        assert_eq!(provider.get_config().await.unwrap(), RelayConfig::default());
    }
}
