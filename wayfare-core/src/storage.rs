use std::collections::HashMap;

use crate::StorageError;

/// Key holding the serialized trip collection.
pub const TRIPS_KEY: &str = "simple-transport-trips";
/// Key holding the serialized traveler registry.
pub const TRAVELERS_KEY: &str = "simple-transport-travelers";

/// Key-value blob store backing the trip repository
pub trait BlobStore: Send {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StorageError>;
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StorageError> {
        (**self).save(key, blob)
    }
}

/// Process-local store; counts saves so callers can assert on persistence.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
    save_count: usize,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a key, as if written by an earlier process.
    pub fn with_blob(mut self, key: &str, blob: impl Into<String>) -> Self {
        self.blobs.insert(key.to_string(), blob.into());
        self
    }

    pub fn blob(&self, key: &str) -> Option<&str> {
        self.blobs.get(key).map(String::as_str)
    }

    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// Make every subsequent save fail (simulates a full or read-only disk).
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.save_count += 1;
        if self.failing {
            return Err(StorageError::Backend(format!("save rejected for key {}", key)));
        }
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_counts_saves() {
        let mut store = MemoryStore::new().with_blob(TRIPS_KEY, "[]");
        assert_eq!(store.load(TRIPS_KEY).unwrap().as_deref(), Some("[]"));
        assert!(store.load(TRAVELERS_KEY).unwrap().is_none());

        store.save(TRAVELERS_KEY, "[\"我\"]").unwrap();
        store.set_failing(true);
        assert!(store.save(TRIPS_KEY, "[1]").is_err());

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.blob(TRIPS_KEY), Some("[]"));
    }
}
