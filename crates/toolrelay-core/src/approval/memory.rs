//! In-memory approval store

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::traits::{ApprovalRecord, ApprovalResult, ApprovalStore};

/// In-memory approval store for tests and embedding
///
/// Preferences are lost when the store is dropped.
///
/// # Example
///
/// ```
/// use toolrelay_core::approval::{ApprovalStore, MemoryApprovalStore};
///
/// let store = MemoryApprovalStore::new();
/// store.set("files", "delete", true).unwrap();
/// assert!(store.requires_approval("files", "delete").unwrap());
/// assert!(!store.requires_approval("files", "read").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemoryApprovalStore {
    records: RwLock<BTreeMap<(String, String), bool>>,
}

impl MemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the given records
    pub fn with_records(records: impl IntoIterator<Item = ApprovalRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|r| ((r.server_name, r.tool_name), r.requires_approval))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ApprovalStore for MemoryApprovalStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn requires_approval(&self, server_name: &str, tool_name: &str) -> ApprovalResult<bool> {
        let key = (server_name.to_string(), tool_name.to_string());
        Ok(self.records.read().get(&key).copied().unwrap_or(false))
    }

    fn set(&self, server_name: &str, tool_name: &str, requires_approval: bool) -> ApprovalResult<()> {
        self.records
            .write()
            .insert((server_name.to_string(), tool_name.to_string()), requires_approval);
        Ok(())
    }

    fn delete(&self, server_name: &str, tool_name: &str) -> ApprovalResult<()> {
        self.records
            .write()
            .remove(&(server_name.to_string(), tool_name.to_string()));
        Ok(())
    }

    fn list(&self) -> ApprovalResult<Vec<ApprovalRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .map(|((server, tool), required)| ApprovalRecord::new(server, tool, *required))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_means_no_approval() {
        let store = MemoryApprovalStore::new();
        assert!(!store.requires_approval("weather", "search").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_and_delete() {
        let store = MemoryApprovalStore::new();
        store.set("files", "delete", true).unwrap();
        store.set("files", "read", false).unwrap();

        assert!(store.requires_approval("files", "delete").unwrap());
        assert!(!store.requires_approval("files", "read").unwrap());
        // Scoped per server
        assert!(!store.requires_approval("backup", "delete").unwrap());

        store.delete("files", "delete").unwrap();
        assert!(!store.requires_approval("files", "delete").unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_list_is_ordered() {
        let store = MemoryApprovalStore::with_records([
            ApprovalRecord::new("weather", "search", true),
            ApprovalRecord::new("files", "write", true),
            ApprovalRecord::new("files", "delete", false),
        ]);
        let listed: Vec<String> = store
            .list()
            .unwrap()
            .iter()
            .map(|r| format!("{}.{}", r.server_name, r.tool_name))
            .collect();
        assert_eq!(listed, vec!["files.delete", "files.write", "weather.search"]);
    }
}
