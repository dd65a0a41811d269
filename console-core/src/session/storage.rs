//! Durable string key-value backends behind the session store.
//!
//! A backend applies each `set_all`/`remove_all` call as one write, so a reader
//! never observes half of a multi-key update.

use crate::error::ConsoleError;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ConsoleError>;

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), ConsoleError>;

    fn remove_all(&self, keys: &[&str]) -> Result<(), ConsoleError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> ConsoleError {
    ConsoleError::Storage("session storage lock poisoned".to_string())
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<(), ConsoleError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        for (key, value) in pairs {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), ConsoleError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Stores all entries in one JSON object file.
///
/// Writes go to a sibling temp file that is renamed over the original.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, ConsoleError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Session file is corrupt, treating it as empty"
                );
                Ok(HashMap::new())
            }
        }
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), ConsoleError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let body = serde_json::to_vec_pretty(entries)
            .map_err(|e| ConsoleError::Storage(format!("failed to encode session: {}", e)))?;

        let tmp_path = self.path.with_extension("tmp");
        let mut file = open_private(&tmp_path)?;
        file.write_all(&body)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), ConsoleError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut entries = self.read_entries()?;
        apply(&mut entries);
        self.write_entries(&entries)
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self.read_entries()?.remove(key))
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<(), ConsoleError> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), ConsoleError> {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}
