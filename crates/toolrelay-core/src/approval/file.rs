//! File-based approval store (YAML)
//!
//! The file maps server names to tool names to a boolean:
//!
//! ```yaml
//! files:
//!   delete: true
//!   write: true
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::traits::{ApprovalRecord, ApprovalResult, ApprovalStore};

type ApprovalMap = BTreeMap<String, BTreeMap<String, bool>>;

/// Approval preferences persisted in a YAML file
pub struct FileApprovalStore {
    path: PathBuf,
    cache: RwLock<Option<ApprovalMap>>,
}

impl FileApprovalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// User-level store (~/.config/toolrelay/approvals.yaml)
    pub fn user() -> Self {
        Self::new(Self::user_path())
    }

    pub fn user_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("toolrelay").join("approvals.yaml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> ApprovalResult<ApprovalMap> {
        if !self.path.exists() {
            return Ok(ApprovalMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ApprovalMap::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn cached(&self) -> ApprovalResult<ApprovalMap> {
        if let Some(map) = self.cache.read().as_ref() {
            return Ok(map.clone());
        }
        let map = self.load()?;
        *self.cache.write() = Some(map.clone());
        Ok(map)
    }

    fn save(&self, map: ApprovalMap) -> ApprovalResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_yaml::to_string(&map)?)?;
        *self.cache.write() = Some(map);
        Ok(())
    }

    /// Drop the cache so the next read goes to disk
    pub fn reload(&self) {
        *self.cache.write() = None;
    }
}

impl std::fmt::Debug for FileApprovalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileApprovalStore")
            .field("path", &self.path)
            .finish()
    }
}

impl ApprovalStore for FileApprovalStore {
    fn name(&self) -> &str {
        "file"
    }

    fn requires_approval(&self, server_name: &str, tool_name: &str) -> ApprovalResult<bool> {
        let map = self.cached()?;
        Ok(map
            .get(server_name)
            .and_then(|tools| tools.get(tool_name))
            .copied()
            .unwrap_or(false))
    }

    fn set(&self, server_name: &str, tool_name: &str, requires_approval: bool) -> ApprovalResult<()> {
        let mut map = self.cached()?;
        map.entry(server_name.to_string())
            .or_default()
            .insert(tool_name.to_string(), requires_approval);
        self.save(map)
    }

    fn delete(&self, server_name: &str, tool_name: &str) -> ApprovalResult<()> {
        let mut map = self.cached()?;
        let Some(tools) = map.get_mut(server_name) else {
            return Ok(());
        };
        tools.remove(tool_name);
        if tools.is_empty() {
            map.remove(server_name);
        }
        self.save(map)
    }

    fn list(&self) -> ApprovalResult<Vec<ApprovalRecord>> {
        let map = self.cached()?;
        Ok(map
            .iter()
            .flat_map(|(server, tools)| {
                tools
                    .iter()
                    .map(move |(tool, required)| ApprovalRecord::new(server, tool, *required))
            })
            .collect())
    }
}
