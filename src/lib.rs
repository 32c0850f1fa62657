//! # zipfan
//!
//! Unpacks a ZIP archive held in an object store and re-uploads every entry
//! as its own object.
//!
//! One event names a source archive (bucket + key) and a destination
//! (bucket + key prefix). The handler downloads the whole archive into
//! memory, parses its central directory, and fans out one task per entry
//! that decompresses the entry and puts it to `prefix/entry-name`. Entry
//! failures are isolated: a corrupt or unuploadable entry is recorded and
//! reported, and every other entry still transfers.
//!
//! ## Features
//!
//! - ZIP central directory parsing, including ZIP64 archives
//! - STORED and DEFLATE entries
//! - Unbounded fan-out by default, optional concurrency cap
//! - Pluggable object store: AWS S3 (and S3-compatible endpoints), plus an
//!   in-memory store for tests and dry runs
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zipfan::{S3Store, UnzipEvent, UnzipHandler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(S3Store::from_env(None, None).await);
//!     let handler = UnzipHandler::new(store);
//!
//!     let event = UnzipEvent {
//!         origin_bucket: "uploads".to_string(),
//!         archive_key: "incoming/batch.zip".to_string(),
//!         target_bucket: "content".to_string(),
//!         target_prefix: "unpacked/2024".to_string(),
//!     };
//!
//!     let response = handler.handle(&event).await?;
//!     println!("unpacked {} entries", response.count);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod dispatch;
pub mod event;
pub mod handler;
pub mod store;
pub mod zip;

pub use cli::Cli;
pub use dispatch::{EntryFailure, ExtractionSummary, UploadDispatcher, UploadOutcome};
pub use event::{UnzipEvent, UnzipResponse};
pub use handler::{HandlerError, UnzipHandler};
pub use store::{MemoryStore, ObjectStore, S3Store, StoreError};
pub use zip::{ZipArchive, ZipFileEntry};
