mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Object store failures, split by what the caller can do about them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("object store request failed")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Capability surface of a key-addressed blob store.
///
/// Implementations must be safe for concurrent use: many entry tasks call
/// [`put`](ObjectStore::put) on the same instance at once.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the complete object at `bucket`/`key`.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError>;

    /// Write `body` as the object at `bucket`/`key`.
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StoreError>;
}
