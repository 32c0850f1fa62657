use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use std::io::{Cursor, Read};

use thiserror::Error;

use super::parser::ZipArchive;
use super::structures::{CompressionMethod, LFH_SIGNATURE, LFH_SIZE, ZipFileEntry};

/// Failure to read one entry out of the archive.
///
/// Scoped to the entry it names; sibling entries are unaffected.
#[derive(Debug, Error)]
#[error("entry {name:?}: {kind}")]
pub struct EntryError {
    pub name: String,
    #[source]
    pub kind: EntryErrorKind,
}

#[derive(Debug, Error)]
pub enum EntryErrorKind {
    #[error("unsupported compression method {0}")]
    UnsupportedMethod(u16),
    #[error("invalid local file header")]
    InvalidLocalHeader,
    #[error("compressed data lies outside the archive")]
    DataOutOfBounds,
    #[error("corrupt compressed stream")]
    Corrupt(#[source] std::io::Error),
    #[error("decompressed to {actual} bytes, central directory records {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
}

impl ZipArchive {
    /// Decompress a single entry fully into memory.
    ///
    /// Supports STORED and DEFLATE entries; directory entries decompress to
    /// an empty buffer. All intermediate state is scoped to this call, so
    /// nothing is left behind on either exit path.
    ///
    /// # Errors
    ///
    /// Returns an [`EntryError`] naming the entry if its local header is
    /// invalid, its data falls outside the archive, the compressed stream
    /// is corrupt, or the output disagrees with the directory's recorded
    /// uncompressed size.
    pub fn read_entry(&self, entry: &ZipFileEntry) -> Result<Vec<u8>, EntryError> {
        let fail = |kind| EntryError {
            name: entry.file_name.clone(),
            kind,
        };

        let data_offset = self.entry_data_offset(entry).map_err(fail)?;

        let data_end = data_offset
            .checked_add(entry.compressed_size)
            .filter(|end| *end <= self.data().len() as u64)
            .ok_or_else(|| fail(EntryErrorKind::DataOutOfBounds))?;
        let compressed = &self.data()[data_offset as usize..data_end as usize];

        let output = match entry.compression_method {
            CompressionMethod::Stored => compressed.to_vec(),
            CompressionMethod::Deflate => {
                let mut output = Vec::with_capacity(entry.uncompressed_size as usize);
                let mut decoder = DeflateDecoder::new(compressed);
                decoder
                    .read_to_end(&mut output)
                    .map_err(|err| fail(EntryErrorKind::Corrupt(err)))?;
                output
            }
            CompressionMethod::Unknown(method) => {
                return Err(fail(EntryErrorKind::UnsupportedMethod(method)));
            }
        };

        if output.len() as u64 != entry.uncompressed_size {
            return Err(fail(EntryErrorKind::SizeMismatch {
                expected: entry.uncompressed_size,
                actual: output.len() as u64,
            }));
        }

        Ok(output)
    }

    /// Resolve where an entry's compressed data begins.
    ///
    /// The Local File Header repeats the name and extra field with lengths
    /// that may differ from the central directory's, so the LFH has to be
    /// read to find the data that follows it.
    fn entry_data_offset(&self, entry: &ZipFileEntry) -> Result<u64, EntryErrorKind> {
        let lfh_end = entry
            .lfh_offset
            .checked_add(LFH_SIZE as u64)
            .filter(|end| *end <= self.data().len() as u64)
            .ok_or(EntryErrorKind::InvalidLocalHeader)?;
        let lfh = &self.data()[entry.lfh_offset as usize..lfh_end as usize];

        // Verify LFH signature (PK\x03\x04)
        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(EntryErrorKind::InvalidLocalHeader);
        }

        // The name and extra lengths sit at fixed positions in the LFH
        let mut cursor = Cursor::new(lfh);
        cursor.set_position(26);
        let file_name_length = cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| EntryErrorKind::InvalidLocalHeader)? as u64;
        let extra_field_length = cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| EntryErrorKind::InvalidLocalHeader)? as u64;

        // Data starts after: LFH (30 bytes) + filename + extra field
        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }
}
