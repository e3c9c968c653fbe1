//! Key-value persistence
//!
//! Progress, settings and scores live in a string key-value store: browser
//! LocalStorage on the web, an in-memory map elsewhere. Reads and writes are
//! tolerant. A missing store or a malformed value degrades to defaults and is
//! logged, never surfaced as a crash.

#[cfg(target_arch = "wasm32")]
pub mod local_storage;

use std::collections::HashMap;

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage error: {0}")]
    Backend(String),
}

/// String key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-memory store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store that refuses everything (storage disabled or private browsing)
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

/// The platform's store: LocalStorage when the browser offers it
#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Box<dyn KeyValueStore> {
    match LocalStorage::open() {
        Some(storage) => Box::new(storage),
        None => {
            warn!("LocalStorage unavailable, progress will not be saved");
            Box::new(UnavailableStore)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn default_store() -> Box<dyn KeyValueStore> {
    Box::new(MemoryStore::new())
}

/// Raw string value, `None` when missing or unreadable
pub fn load_raw<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read {key}: {e}");
            None
        }
    }
}

/// Write a raw string value; failures are logged. Returns whether it stuck.
pub fn save_raw<S: KeyValueStore + ?Sized>(store: &mut S, key: &str, value: &str) -> bool {
    match store.set(key, value) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to write {key}: {e}");
            false
        }
    }
}

/// JSON value, `None` when missing, unreadable or malformed
pub fn load<T: DeserializeOwned, S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<T> {
    let json = load_raw(store, key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring malformed {key}: {e}");
            None
        }
    }
}

pub fn load_or<T: DeserializeOwned, S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    default: T,
) -> T {
    load(store, key).unwrap_or(default)
}

/// Serialize and write a value; failures are logged. Returns whether it stuck.
pub fn save<T: Serialize, S: KeyValueStore + ?Sized>(store: &mut S, key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => save_raw(store, key, &json),
        Err(e) => {
            warn!("Failed to serialize {key}: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        level: u32,
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        let sample = Sample {
            name: "Explorer".into(),
            level: 3,
        };
        assert!(save(&mut store, "sample", &sample));
        assert_eq!(load::<Sample, _>(&store, "sample"), Some(sample));

        store.remove("sample").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_key_uses_default() {
        let store = MemoryStore::new();
        assert_eq!(load_or(&store, "nothing", 7u32), 7);
    }

    #[test]
    fn test_malformed_value_uses_default() {
        let mut store = MemoryStore::new();
        store.set("level", "{not json").unwrap();
        assert_eq!(load_or(&store, "level", 1u32), 1);
    }

    #[test]
    fn test_unavailable_store_is_tolerated() {
        let mut store = UnavailableStore;
        assert_eq!(load_or(&store, "level", 2u32), 2);
        assert!(!save(&mut store, "level", &5u32));
        assert!(!save_raw(&mut store, "name", "Ada"));
        assert_eq!(store.get("level"), Err(StoreError::Unavailable));
    }

    #[test]
    fn test_boxed_store() {
        let mut store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        assert!(save_raw(&mut store, "playerName", "Ada"));
        assert_eq!(load_raw(&store, "playerName").as_deref(), Some("Ada"));
    }
}
