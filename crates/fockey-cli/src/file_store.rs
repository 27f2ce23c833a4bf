//! JSON file backing for the settings store.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fockey_core::store::{ChangeListener, SubscriptionId};
use fockey_core::{MemoryStore, SettingsStore};
use serde_json::Value;
use tempfile::NamedTempFile;

/// Settings kept in one JSON object on disk, keyed like the extension's storage.
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    dirty: bool,
}

impl FileStore {
    /// Open `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let values: BTreeMap<String, Value> = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read state from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse state file {}", path.display()))?
        } else {
            log::debug!("no state file at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            inner: MemoryStore::from_values(values),
            dirty: false,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the store if anything changed since it was opened.
    pub fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let content = serde_json::to_string_pretty(self.inner.values())?;
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.flush()?;
        temp_file
            .persist(&self.path)
            .with_context(|| format!("Failed to write state to {}", self.path.display()))?;

        log::debug!("state written to {}", self.path.display());
        self.dirty = false;
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        if self.inner.get(key).as_ref() != Some(&value) {
            self.dirty = true;
        }
        self.inner.set(key, value);
    }

    fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId {
        self.inner.subscribe(listener)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }
}
