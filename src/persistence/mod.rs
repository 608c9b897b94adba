//! Key/value persistence back-ends
//!
//! Everything persisted is a small JSON document under a fixed key. Readers
//! go through [`load_or_default`], which turns missing or corrupt data into
//! the type's default instead of an error.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod local;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

/// String key/value store
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile store, used by tests and as a fallback when nothing else works
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Read and parse `key`, falling back to `T::default()` on any failure
pub fn load_or_default<T>(storage: &dyn Storage, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match storage.get(key) {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Discarding corrupt '{}': {}", key, e);
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            log::warn!("Failed to read '{}': {}", key, e);
            T::default()
        }
    }
}

/// Serialize `value` and store it under `key`
pub fn save<T: Serialize>(storage: &mut dyn Storage, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, serde::Deserialize, Serialize)]
    struct Doc {
        value: u32,
    }

    #[test]
    fn test_memory_roundtrip() {
        let mut store = MemoryStorage::new();
        assert!(store.get("a").unwrap().is_none());
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_missing_is_default() {
        let store = MemoryStorage::new();
        let doc: Doc = load_or_default(&store, "doc");
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn test_load_corrupt_is_default() {
        let mut store = MemoryStorage::new();
        store.set("doc", "{not json").unwrap();
        let doc: Doc = load_or_default(&store, "doc");
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStorage::new();
        save(&mut store, "doc", &Doc { value: 7 }).unwrap();
        let doc: Doc = load_or_default(&store, "doc");
        assert_eq!(doc.value, 7);
    }
}
