//! In-memory object store, used by tests and dry runs.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{ObjectInfo, ObjectStore};
use crate::error::DataError;

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<(String, String), Vec<u8>>>, DataError> {
        self.objects
            .lock()
            .map_err(|_| DataError::Io("memory store lock poisoned".into()))
    }
}

impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, DataError> {
        self.lock()?
            .get(&(container.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            })
    }

    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), DataError> {
        self.lock()?
            .insert((container.to_string(), key.to_string()), bytes.to_vec());
        Ok(())
    }

    fn list(&self, container: &str) -> Result<Vec<ObjectInfo>, DataError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|((c, _), _)| c == container)
            .map(|((_, key), _)| ObjectInfo { key: key.clone() })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containers_are_isolated() {
        let store = MemoryObjectStore::new();
        store.put("a", "k", b"1").unwrap();
        store.put("b", "k", b"2").unwrap();

        assert_eq!(store.get("a", "k").unwrap(), b"1");
        assert_eq!(store.list("b").unwrap().len(), 1);
        assert!(store.list("c").unwrap().is_empty());
    }

    #[test]
    fn exists_distinguishes_missing_keys() {
        let store = MemoryObjectStore::new();
        store.put("a", "k", b"1").unwrap();

        assert!(store.exists("a", "k").unwrap());
        assert!(!store.exists("a", "missing").unwrap());
    }
}
