use crate::error::ParleyError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Flat, synchronous key-value store holding serialized values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ParleyError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ParleyError>;
    fn remove(&self, key: &str) -> Result<(), ParleyError>;
}

/// Stores each key as `<key>.json` inside a directory.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed.
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Result<Self, ParleyError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| {
            ParleyError::Storage(format!(
                "Failed to create data directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;

        Ok(Self { base_dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ParleyError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path).map(Some).map_err(|e| {
            ParleyError::Storage(format!("Failed to read {}: {}", path.display(), e))
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ParleyError> {
        let path = self.key_path(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, value).map_err(|e| {
            ParleyError::Storage(format!("Failed to write temporary file for {key}: {e}"))
        })?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            ParleyError::Storage(format!("Failed to rename file for {key}: {e}"))
        })?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ParleyError> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                ParleyError::Storage(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

/// In-process store; contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, ParleyError> {
        self.entries
            .lock()
            .map_err(|_| ParleyError::Storage("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ParleyError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ParleyError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ParleyError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Used when no storage is available: reads are empty, writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedStore;

impl KeyValueStore for DetachedStore {
    fn get(&self, _key: &str) -> Result<Option<String>, ParleyError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), ParleyError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::with_dir(dir.path().join("data")).unwrap();

        assert_eq!(store.get("settings").unwrap(), None);
        store.set("settings", "{\"model\":\"m\"}").unwrap();
        assert_eq!(
            store.get("settings").unwrap().as_deref(),
            Some("{\"model\":\"m\"}")
        );
        assert!(!dir.path().join("data").join("settings.json.tmp").exists());

        store.remove("settings").unwrap();
        assert_eq!(store.get("settings").unwrap(), None);
        // Removing an absent key is fine.
        store.remove("settings").unwrap();
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        store.set("k", "1").unwrap();
        store.set("k", "2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_detached_store_is_inert() {
        let store = DetachedStore;
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.remove("k").unwrap();
    }
}
