//! ZIP archive parsing and extraction.
//!
//! This module reads ZIP archives out of a complete in-memory buffer,
//! supporting both standard ZIP format and ZIP64 extensions for large
//! archives.
//!
//! ## Architecture
//!
//! The module is organized into three main components:
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from the raw buffer
//! - [`extractor`]: Per-entry decompression into memory
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Parsing starts from the EOCD at the end of the buffer, then walks the
//! Central Directory. The resulting [`ZipArchive`] is immutable and is
//! shared read-only by every concurrent extraction task, so entries can be
//! decompressed in any order and in parallel.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED (no compression) method
//! - DEFLATE compression method
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

#[cfg(test)]
pub(crate) mod testdata;

pub use extractor::{EntryError, EntryErrorKind};
pub use parser::{ParseError, ZipArchive};
pub use structures::*;
