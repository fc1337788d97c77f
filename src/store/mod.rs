//! History persistence.
//!
//! The history list is persisted as a JSON array of descriptor records.
//! Decoding is lenient: an unparseable payload is reported and treated
//! as an empty history, never as a fatal error.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::ResourceDescriptor;

/// Storage key of the persisted history payload.
pub const HISTORY_STORAGE_KEY: &str = "history.entries";

/// Where a persisted value belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Scoped to the open workspace.
    Workspace,
    /// Scoped to the user profile, shared across workspaces.
    Profile,
}

/// Key/value persistence consumed by the engine.
pub trait HistoryStore {
    fn get(&self, key: &str, scope: StorageScope) -> Option<String>;

    fn store(&mut self, key: &str, value: String, scope: StorageScope) -> Result<()>;
}

/// One persisted history record. Only descriptor-backed entries are
/// ever persisted; live-handle-only entries are lost across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub editor: ResourceDescriptor,
}

/// Serializes history records to the persisted text form.
pub fn encode_entries(entries: &[PersistedEntry]) -> Result<String> {
    serde_json::to_string(entries).context("failed to serialize history entries")
}

/// Parses a persisted payload, treating garbage as an empty history.
pub fn decode_entries(payload: &str) -> Vec<PersistedEntry> {
    match serde_json::from_str(payload) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "discarding unparseable history payload");
            Vec::new()
        }
    }
}

/// In-memory store, for tests and embedders without persistence.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    values: HashMap<(StorageScope, String), String>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn get(&self, key: &str, scope: StorageScope) -> Option<String> {
        self.values.get(&(scope, key.to_string())).cloned()
    }

    fn store(&mut self, key: &str, value: String, scope: StorageScope) -> Result<()> {
        self.values.insert((scope, key.to_string()), value);
        Ok(())
    }
}

/// File-backed store keeping one JSON map per scope.
#[derive(Debug)]
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store rooted at `~/.config/navquill/state`.
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("navquill");
            path.push("state");
            Self::new(path)
        })
    }

    fn path_for(&self, scope: StorageScope) -> PathBuf {
        let file = match scope {
            StorageScope::Workspace => "workspace.json",
            StorageScope::Profile => "profile.json",
        };
        self.dir.join(file)
    }

    fn read_map(&self, scope: StorageScope) -> HashMap<String, String> {
        let path = self.path_for(scope);
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }
}

impl HistoryStore for FileHistoryStore {
    fn get(&self, key: &str, scope: StorageScope) -> Option<String> {
        self.read_map(scope).remove(key)
    }

    fn store(&mut self, key: &str, value: String, scope: StorageScope) -> Result<()> {
        let mut map = self.read_map(scope);
        map.insert(key.to_string(), value);

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("could not create {}", self.dir.display()))?;

        let path = self.path_for(scope);
        let contents = serde_json::to_string_pretty(&map)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("could not write {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceId;

    #[test]
    fn test_decode_garbage_is_empty() {
        assert!(decode_entries("not json at all").is_empty());
        assert!(decode_entries("{\"wrong\": \"shape\"}").is_empty());
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let entries = vec![PersistedEntry {
            editor: ResourceDescriptor::new(ResourceId::parse("file:///a.rs").unwrap()),
        }];
        let payload = encode_entries(&entries).unwrap();
        assert_eq!(decode_entries(&payload), entries);
    }
}
