//! Fan-out of per-entry extract+upload work.
//!
//! The dispatcher schedules one task per archive entry: decompress the
//! entry, join its name onto the destination prefix, and put the bytes to
//! the object store. Tasks run concurrently with no ordering between them;
//! the dispatcher returns only once every task has finished.
//!
//! Failure isolation is per entry. A task that fails — unreadable entry,
//! failed upload, even a panic — is recorded as a failed [`UploadOutcome`]
//! and its siblings keep running. Exactly one outcome is produced for every
//! entry in the archive.
//!
//! By default fan-out is unbounded: one task per entry, all scheduled at
//! once. Very large archives can exhaust memory or the destination store's
//! connection limits that way, so a concurrency cap is available through
//! [`UploadDispatcher::with_max_concurrency`].

use bytes::Bytes;
use futures::future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::store::{ObjectStore, StoreError};
use crate::zip::{EntryError, ZipArchive};

/// Why one entry's transfer failed. Never affects sibling entries.
#[derive(Debug, Error)]
pub enum EntryFailure {
    #[error(transparent)]
    Extract(#[from] EntryError),
    #[error("upload failed: {0}")]
    Upload(StoreError),
    #[error("entry task aborted: {0}")]
    Aborted(String),
}

/// Per-entry transfer result.
#[derive(Debug)]
pub struct UploadOutcome {
    /// Entry name as recorded in the archive.
    pub name: String,
    /// Destination key the entry was uploaded to (or would have been).
    pub key: String,
    pub result: Result<(), EntryFailure>,
}

/// Aggregate of a completed dispatch: one outcome per archive entry.
#[derive(Debug)]
pub struct ExtractionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub outcomes: Vec<UploadOutcome>,
}

impl ExtractionSummary {
    /// Names of the entries whose transfer failed.
    pub fn failed_names(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .map(|outcome| outcome.name.clone())
            .collect()
    }
}

/// Schedules and joins the per-entry transfer tasks.
pub struct UploadDispatcher<S> {
    store: Arc<S>,
    max_concurrency: Option<NonZeroUsize>,
}

impl<S: ObjectStore + 'static> UploadDispatcher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_concurrency: None,
        }
    }

    /// Cap the number of entry tasks running at once.
    ///
    /// Without a cap, every entry's task runs concurrently.
    pub fn with_max_concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    /// Transfer every entry of `archive` to `bucket` under `prefix`.
    ///
    /// Returns after all entry tasks have completed, with exactly one
    /// [`UploadOutcome`] per entry. Per-entry failures are recorded, not
    /// propagated; this method itself cannot fail.
    pub async fn dispatch(
        &self,
        archive: Arc<ZipArchive>,
        bucket: &str,
        prefix: &str,
    ) -> ExtractionSummary {
        let total = archive.entries().len();
        let limiter = self
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.get())));

        let mut labels = Vec::with_capacity(total);
        let mut handles = Vec::with_capacity(total);

        for (index, entry) in archive.entries().iter().enumerate() {
            let name = entry.file_name.clone();
            let key = destination_key(prefix, &name);
            labels.push((name, key.clone()));

            let archive = Arc::clone(&archive);
            let store = Arc::clone(&self.store);
            let bucket = bucket.to_string();
            let limiter = limiter.clone();

            handles.push(tokio::spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => match limiter.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            return Err(EntryFailure::Aborted(
                                "concurrency limiter closed".to_string(),
                            ));
                        }
                    },
                    None => None,
                };
                transfer_entry(&archive, index, store.as_ref(), &bucket, &key).await
            }));
        }

        // Join barrier: nothing below runs until every task has finished
        let joined = future::join_all(handles).await;

        let mut outcomes = Vec::with_capacity(total);
        for ((name, key), joined) in labels.into_iter().zip(joined) {
            let result = match joined {
                Ok(result) => result,
                Err(err) => Err(EntryFailure::Aborted(err.to_string())),
            };
            if let Err(err) = &result {
                warn!(entry = %name, error = %err, "entry transfer failed");
            }
            outcomes.push(UploadOutcome { name, key, result });
        }

        let succeeded = outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .count();

        ExtractionSummary {
            total,
            succeeded,
            outcomes,
        }
    }
}

async fn transfer_entry<S: ObjectStore + ?Sized>(
    archive: &ZipArchive,
    index: usize,
    store: &S,
    bucket: &str,
    key: &str,
) -> Result<(), EntryFailure> {
    let entry = &archive.entries()[index];
    debug!(entry = %entry.file_name, key, "uploading entry");

    let data = archive.read_entry(entry)?;
    store
        .put(bucket, key, Bytes::from(data))
        .await
        .map_err(EntryFailure::Upload)?;

    debug!(key, "uploaded entry");
    Ok(())
}

/// Join a destination prefix and an entry name into an object key.
///
/// Single separating slash regardless of how the prefix or name are
/// decorated; an empty prefix yields the bare name.
fn destination_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
