//! Request orchestration: download, parse, dispatch, respond.
//!
//! One [`UnzipHandler`] lives for the whole process and serves one event at
//! a time per call: fetch the archive from the origin bucket, parse its
//! central directory, fan the entries out through the dispatcher, and build
//! the response. Download and parse failures are fatal for the invocation
//! and surface as [`HandlerError`]; per-entry failures never are — they end
//! up in the response's failure list while the invocation still succeeds.

use bytes::Bytes;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::info;

use crate::dispatch::UploadDispatcher;
use crate::event::{UnzipEvent, UnzipResponse};
use crate::store::{ObjectStore, StoreError};
use crate::zip::{ParseError, ZipArchive};

/// Failures that abort the whole invocation.
///
/// Everything else (per-entry trouble) is absorbed by the dispatcher and
/// reported through the response instead.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to download archive s3://{bucket}/{key}")]
    Download {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("archive is not a valid ZIP file")]
    CorruptArchive(#[from] ParseError),
}

/// Processes unzip events against an object store.
pub struct UnzipHandler<S> {
    store: Arc<S>,
    dispatcher: UploadDispatcher<S>,
    invocations: AtomicU64,
}

impl<S: ObjectStore + 'static> UnzipHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        let dispatcher = UploadDispatcher::new(Arc::clone(&store));
        Self {
            store,
            dispatcher,
            invocations: AtomicU64::new(0),
        }
    }

    /// Cap the dispatcher's fan-out; unbounded when never called.
    pub fn with_max_concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.dispatcher = self.dispatcher.with_max_concurrency(limit);
        self
    }

    /// How many events this process has handled. Diagnostic only; resets
    /// with the process.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Handle one event end to end.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the archive cannot be downloaded or
    /// parsed. Per-entry extraction or upload failures do not error; the
    /// response reports them while `success` stays `true`.
    pub async fn handle(&self, event: &UnzipEvent) -> Result<UnzipResponse, HandlerError> {
        let invocation = self.invocations.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            invocation,
            bucket = %event.origin_bucket,
            key = %event.archive_key,
            "handling unzip event"
        );

        let data = self.download(&event.origin_bucket, &event.archive_key).await?;
        info!(bytes = data.len(), "downloaded archive");

        let archive = Arc::new(ZipArchive::parse(data)?);
        let count = archive.entries().len();
        info!(entries = count, "parsed archive index");

        let summary = self
            .dispatcher
            .dispatch(archive, &event.target_bucket, &event.target_prefix)
            .await;
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            "finished extracting archive"
        );

        Ok(UnzipResponse {
            success: true,
            message: "Success".to_string(),
            bucket: event.target_bucket.clone(),
            prefix: event.target_prefix.clone(),
            count,
            failed: summary.failed_names(),
        })
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Bytes, HandlerError> {
        self.store
            .get(bucket, key)
            .await
            .map_err(|source| HandlerError::Download {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })
    }
}
