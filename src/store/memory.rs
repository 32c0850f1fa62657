use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{ObjectStore, StoreError};

/// In-memory object store.
///
/// Backs the test suite and local dry runs. `reject_puts` injects a
/// transport failure for a given destination key, which is how the tests
/// exercise per-entry upload failure isolation.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Bytes>>,
    rejected_keys: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without going through the async interface.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects
            .lock()
            .expect("store lock poisoned")
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    /// Look up an object, if present.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .expect("store lock poisoned")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects, across all buckets.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every future `put` to `key` fail with a transport error.
    pub fn reject_puts(&self, key: &str) {
        self.rejected_keys
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string());
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        self.object(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StoreError> {
        let rejected = self
            .rejected_keys
            .lock()
            .expect("store lock poisoned")
            .contains(key);
        if rejected {
            return Err(StoreError::Transport(Box::new(std::io::Error::other(
                "injected put failure",
            ))));
        }

        self.insert(bucket, key, body);
        Ok(())
    }
}
