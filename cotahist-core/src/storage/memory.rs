//! In-process store.

use super::{validate_name, BlobStore, StorageError};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `entries`.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, Vec<u8>)>) -> Self {
        let blobs = entries
            .into_iter()
            .map(|(name, bytes)| (name.to_string(), bytes))
            .collect();
        Self {
            blobs: Mutex::new(blobs),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blobs().contains_key(name)
    }

    fn blobs(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlobStore for MemoryStore {
    fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.blobs().keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        validate_name(name)?;
        self.blobs().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.blobs()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn location(&self, name: &str) -> String {
        format!("memory://{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_sorted() {
        let store = MemoryStore::with_entries([("b", vec![]), ("a", vec![1])]);
        assert_eq!(store.list().unwrap(), ["a", "b"]);
    }

    #[test]
    fn write_then_delete() {
        let store = MemoryStore::new();
        store.write("COTAHIST_A2000.ZIP", &[1, 2, 3]).unwrap();
        assert!(store.contains("COTAHIST_A2000.ZIP"));
        assert_eq!(store.read("COTAHIST_A2000.ZIP").unwrap(), [1, 2, 3]);

        store.delete("COTAHIST_A2000.ZIP").unwrap();
        assert!(!store.contains("COTAHIST_A2000.ZIP"));
        assert!(store.delete("COTAHIST_A2000.ZIP").is_err());
    }
}
