//! Configuration
//!
//! Supports multiple configuration sources:
//! - `MemoryConfigProvider`: In-memory for testing
//! - `FileConfigProvider`: YAML file-based

mod traits;
mod memory;
mod file;
mod settings;

pub use traits::{ConfigProvider, ConfigError, ConfigResult};
pub use memory::MemoryConfigProvider;
pub use file::FileConfigProvider;
pub use settings::{
    ArgumentValidation, LoopSettings, ModelSettings, RelayConfig, ServerConfig, ServerEndpoint,
    ToolErrorPolicy,
};
