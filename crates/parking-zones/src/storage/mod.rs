//! Durable key-value storage used by the zone repository.
//!
//! This module provides a single trait `StorageBackend` and three concrete
//! implementations:
//!
//! - `WebLocalStorage` (compiled for `wasm32`): uses `window.localStorage`.
//! - `FileStorage` (native targets): a single JSON file holding a map of string
//!   keys to string values, in a per-user configuration directory. Reads and
//!   writes are synchronous; every write replaces the file atomically.
//! - `MemoryStorage`: a process-local map, for ephemeral sessions and tests.
//!
//! Structured values go through the `save_json_backend` / `load_json_backend`
//! helpers, which keep the trait object-safe.

use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Platform storage error: {0}")]
    Platform(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Simple string key-value storage backend.
pub trait StorageBackend: Send + Sync {
    /// Store a string value for a key.
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Read a string value for a key. Returns Ok(None) when key is missing.
    fn get_string(&self, key: &str) -> StorageResult<Option<String>>;

    /// Remove a key (no-op if key does not exist).
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// All stored keys.
    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(Vec::new())
    }
}

pub fn save_json_backend<T: Serialize + ?Sized>(
    backend: &dyn StorageBackend,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let s = serde_json::to_string(value).map_err(|e| StorageError::Json(e.to_string()))?;
    backend.set_string(key, &s)
}

pub fn load_json_backend<T: DeserializeOwned>(
    backend: &dyn StorageBackend,
    key: &str,
) -> StorageResult<Option<T>> {
    match backend.get_string(key)? {
        Some(s) => serde_json::from_str::<T>(&s)
            .map(Some)
            .map_err(|e| StorageError::Json(e.to_string())),
        None => Ok(None),
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<T> {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_string(key, value)
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_string(key)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }
}

fn lock_poisoned<T>(e: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Platform(format!("mutex poisoned: {}", e))
}

/// In-memory storage; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut guard = self.inner.lock().map_err(lock_poisoned)?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self.inner.lock().map_err(lock_poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut guard = self.inner.lock().map_err(lock_poisoned)?;
        guard.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let guard = self.inner.lock().map_err(lock_poisoned)?;
        Ok(guard.keys().cloned().collect())
    }
}

//
// Web implementation (localStorage)
//
#[cfg(target_arch = "wasm32")]
mod web_storage {
    use super::*;
    use wasm_bindgen::JsValue;
    use web_sys::Storage;

    fn local_storage() -> Result<Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Platform("no window".into()))?
            .local_storage()
            .map_err(|e| StorageError::Platform(format!("local_storage() failed: {:?}", e)))?
            .ok_or_else(|| StorageError::Platform("local_storage not available".into()))
    }

    /// Browser-backed localStorage implementation.
    pub struct WebLocalStorage;

    impl StorageBackend for WebLocalStorage {
        fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
            // Quota errors surface here and leave the previous value in place
            local_storage()?.set_item(key, value).map_err(|e| {
                StorageError::Platform(format!("set_item error: {:?}", JsValue::from(e)))
            })
        }

        fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
            local_storage()?.get_item(key).map_err(|e| {
                StorageError::Platform(format!("get_item error: {:?}", JsValue::from(e)))
            })
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            local_storage()?.remove_item(key).map_err(|e| {
                StorageError::Platform(format!("remove_item error: {:?}", JsValue::from(e)))
            })
        }

        fn keys(&self) -> StorageResult<Vec<String>> {
            let storage = local_storage()?;
            let len = storage.length().map_err(|e| {
                StorageError::Platform(format!(
                    "local_storage length error: {:?}",
                    JsValue::from(e)
                ))
            })?;
            let mut keys = Vec::with_capacity(len as usize);
            for i in 0..len {
                if let Ok(Some(k)) = storage.key(i) {
                    keys.push(k);
                }
            }
            Ok(keys)
        }
    }

    /// Convenience constructor for the default web backend.
    pub fn default_backend() -> Result<Box<dyn StorageBackend>, StorageError> {
        Ok(Box::new(WebLocalStorage))
    }
}

//
// Native file-backed implementation
//
#[cfg(not(target_arch = "wasm32"))]
mod file_storage {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// File-based storage: a single JSON file holding a map of key -> string value.
    ///
    /// The file is read into memory on creation. Every mutation rewrites the whole
    /// file through a temporary sibling that is renamed into place, so a failed
    /// write never leaves a truncated file behind.
    pub struct FileStorage {
        /// Path to the backing JSON file.
        path: PathBuf,
        /// In-memory copy of key -> value
        inner: Mutex<HashMap<String, String>>,
    }

    impl FileStorage {
        /// Default storage file for the current user:
        /// - On Windows: %APPDATA%/ParkingZones/storage.json
        /// - Else: $HOME/.config/parking-zones/storage.json
        fn default_storage_path() -> PathBuf {
            if cfg!(windows)
                && let Ok(appdata) = std::env::var("APPDATA")
            {
                return Path::new(&appdata).join("ParkingZones").join("storage.json");
            }

            if let Ok(home) = std::env::var("HOME") {
                return Path::new(&home)
                    .join(".config")
                    .join("parking-zones")
                    .join("storage.json");
            }

            Path::new(".").join("parking-zones-storage.json")
        }

        pub fn new_with_path(path: Option<PathBuf>) -> Result<Self, StorageError> {
            let path = path.unwrap_or_else(Self::default_storage_path);

            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Io(format!(
                        "Failed to create storage parent directory: {}",
                        e
                    ))
                })?;
            }

            let mut map: HashMap<String, String> = HashMap::new();
            if path.exists() {
                let s = fs::read_to_string(&path)
                    .map_err(|e| StorageError::Io(format!("Failed to read storage file: {}", e)))?;
                if !s.trim().is_empty() {
                    match serde_json::from_str::<HashMap<String, String>>(&s) {
                        Ok(m) => map = m,
                        Err(e) => {
                            // Corrupted file: start fresh, the next write replaces it
                            tracing::warn!(
                                "Ignoring unreadable storage file {}: {}",
                                path.display(),
                                e
                            );
                        }
                    }
                }
            }

            Ok(FileStorage {
                path,
                inner: Mutex::new(map),
            })
        }

        /// Path of the backing file
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn flush(&self, map: &HashMap<String, String>) -> StorageResult<()> {
            let s = serde_json::to_string_pretty(map)
                .map_err(|e| StorageError::Json(e.to_string()))?;
            let tmp = self.path.with_extension("json.tmp");
            fs::write(&tmp, s).map_err(|e| StorageError::Io(format!("write failed: {}", e)))?;
            fs::rename(&tmp, &self.path)
                .map_err(|e| StorageError::Io(format!("rename failed: {}", e)))
        }

        /// Apply a change to a copy of the map and commit it only once flushed
        fn update(&self, change: impl FnOnce(&mut HashMap<String, String>)) -> StorageResult<()> {
            let mut guard = self.inner.lock().map_err(lock_poisoned)?;
            let mut next = guard.clone();
            change(&mut next);
            self.flush(&next)?;
            *guard = next;
            Ok(())
        }
    }

    impl StorageBackend for FileStorage {
        fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
            self.update(|map| {
                map.insert(key.to_string(), value.to_string());
            })
        }

        fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
            let guard = self.inner.lock().map_err(lock_poisoned)?;
            Ok(guard.get(key).cloned())
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            self.update(|map| {
                map.remove(key);
            })
        }

        fn keys(&self) -> StorageResult<Vec<String>> {
            let guard = self.inner.lock().map_err(lock_poisoned)?;
            Ok(guard.keys().cloned().collect())
        }
    }

    pub fn default_backend() -> Result<Box<dyn StorageBackend>, StorageError> {
        Ok(Box::new(FileStorage::new_with_path(None)?))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_file_storage_persists_across_instances() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("storage.json");

            let storage = FileStorage::new_with_path(Some(path.clone())).unwrap();
            storage.set_string("parking-zones", "[]").unwrap();
            drop(storage);

            let reopened = FileStorage::new_with_path(Some(path)).unwrap();
            assert_eq!(
                reopened.get_string("parking-zones").unwrap().as_deref(),
                Some("[]")
            );
            assert_eq!(reopened.keys().unwrap(), vec!["parking-zones".to_string()]);
        }

        #[test]
        fn test_file_storage_recovers_from_corrupt_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("storage.json");
            fs::write(&path, "{not json").unwrap();

            let storage = FileStorage::new_with_path(Some(path.clone())).unwrap();
            assert_eq!(storage.get_string("parking-zones").unwrap(), None);

            storage.set_string("k", "v").unwrap();
            let contents = fs::read_to_string(&path).unwrap();
            assert!(contents.contains("\"k\""));
        }

        #[test]
        fn test_failed_write_keeps_previous_state() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("storage.json");
            let storage = FileStorage::new_with_path(Some(path.clone())).unwrap();
            storage.set_string("k", "old").unwrap();

            // A directory in the temp file's place makes the write fail
            fs::create_dir(path.with_extension("json.tmp")).unwrap();

            assert!(storage.set_string("k", "new").is_err());
            assert_eq!(storage.get_string("k").unwrap().as_deref(), Some("old"));
            assert!(fs::read_to_string(&path).unwrap().contains("old"));
        }

        #[test]
        fn test_creates_parent_directories() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested").join("zones").join("storage.json");

            let storage = FileStorage::new_with_path(Some(path.clone())).unwrap();
            assert_eq!(storage.path(), path.as_path());
            assert!(storage.path().parent().is_some_and(Path::is_dir));

            storage.set_string("k", "v").unwrap();
            assert!(storage.path().is_file());
        }

        #[test]
        fn test_remove_key() {
            let dir = tempfile::tempdir().unwrap();
            let storage =
                FileStorage::new_with_path(Some(dir.path().join("storage.json"))).unwrap();
            storage.set_string("k", "v").unwrap();
            storage.remove("k").unwrap();
            assert_eq!(storage.get_string("k").unwrap(), None);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file_storage::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use web_storage::WebLocalStorage;

/// Create the default backend for the current platform
#[cfg(target_arch = "wasm32")]
pub use web_storage::default_backend as default_storage_backend;

/// Create the default backend for the current platform
#[cfg(not(target_arch = "wasm32"))]
pub use file_storage::default_backend as default_storage_backend;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_string("k").unwrap(), None);

        storage.set_string("k", "v").unwrap();
        assert_eq!(storage.get_string("k").unwrap().as_deref(), Some("v"));

        storage.remove("k").unwrap();
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_json_helpers() {
        let storage = MemoryStorage::new();
        save_json_backend(&storage, "numbers", &vec![1, 2, 3]).unwrap();

        let loaded: Option<Vec<i32>> = load_json_backend(&storage, "numbers").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));

        storage.set_string("numbers", "garbage").unwrap();
        let err = load_json_backend::<Vec<i32>>(&storage, "numbers").unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }
}
