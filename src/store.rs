//! World-data store: a synchronous keyed map of JSON values.
//!
//! Persistence and sync live behind this seam. The core only ever sees
//! `get`/`set`/`delete`/iterate; latency and reconciliation are the
//! collaborator's concern.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value;

use crate::entity::EntityKey;

/// Narrow store interface the registry is built on.
pub trait WorldStore {
    fn get(&self, key: &EntityKey) -> Option<Value>;
    fn set(&mut self, key: EntityKey, value: Value);
    fn delete(&mut self, key: &EntityKey) -> bool;
    fn keys(&self) -> Vec<EntityKey>;

    /// Persist pending writes, if this store persists at all.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Unflushed writes pending.
    fn dirty(&self) -> bool {
        false
    }
}

/// Get the default storage path for the world file
pub fn default_storage_path() -> PathBuf {
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
    data_dir.join("cellscape").join("world.json")
}

/// Plain in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<EntityKey, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorldStore for MemoryStore {
    fn get(&self, key: &EntityKey) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: EntityKey, value: Value) {
        self.entries.insert(key, value);
    }

    fn delete(&mut self, key: &EntityKey) -> bool {
        self.entries.remove(key).is_some()
    }

    fn keys(&self) -> Vec<EntityKey> {
        self.entries.keys().cloned().collect()
    }
}

/// Store backed by a single JSON file on disk.
#[derive(Debug, Default)]
pub struct FileStore {
    entries: BTreeMap<EntityKey, Value>,
    storage_path: Option<PathBuf>,
    dirty: bool,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from disk, or start empty when the file does not exist yet.
    pub fn load(path: &PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            entries,
            storage_path: Some(path.clone()),
            dirty: false,
        })
    }

    pub fn save(&mut self) -> Result<()> {
        if let Some(path) = &self.storage_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(&self.entries)?;
            std::fs::write(path, content)?;
            self.dirty = false;
        }
        Ok(())
    }

    pub fn set_storage_path(&mut self, path: PathBuf) {
        self.storage_path = Some(path);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl WorldStore for FileStore {
    fn get(&self, key: &EntityKey) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: EntityKey, value: Value) {
        self.entries.insert(key, value);
        self.dirty = true;
    }

    fn delete(&mut self, key: &EntityKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.dirty = true;
        }
        removed
    }

    fn keys(&self) -> Vec<EntityKey> {
        self.entries.keys().cloned().collect()
    }

    fn flush(&mut self) -> Result<()> {
        self.save()
    }

    fn dirty(&self) -> bool {
        self.dirty
    }
}
