//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures from a
//! complete in-memory archive buffer.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data
//!
//! Parsing is a pure function of the buffer: the archive is downloaded in
//! one piece before parsing starts, and nothing here performs I/O.

use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Bytes;
use std::io::{Cursor, Read};

use thiserror::Error;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Why an archive buffer could not be parsed.
///
/// Any of these means the buffer is not a usable ZIP archive; there is no
/// partial recovery, and no entry is extracted from an archive that fails
/// to parse.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("end of central directory record not found")]
    EocdNotFound,
    #[error("invalid end of central directory record")]
    InvalidEocd,
    #[error("invalid ZIP64 end of central directory")]
    InvalidZip64,
    #[error(
        "central directory (offset {offset}, {size} bytes) lies outside the {archive_size}-byte archive"
    )]
    DirectoryOutOfBounds {
        offset: u64,
        size: u64,
        archive_size: u64,
    },
    #[error("invalid central directory file header")]
    InvalidHeader,
    #[error("truncated central directory")]
    Truncated,
}

impl From<std::io::Error> for ParseError {
    fn from(_: std::io::Error) -> Self {
        // Cursor reads over an in-memory slice only fail by running out of
        // bytes, which means the directory data stopped short.
        ParseError::Truncated
    }
}

/// A parsed ZIP archive: the raw buffer plus its central directory index.
///
/// Entries keep the central directory's original order. The archive is
/// read-only after construction and is shared (behind an `Arc`) by every
/// concurrent extraction task.
#[derive(Debug)]
pub struct ZipArchive {
    data: Bytes,
    entries: Vec<ZipFileEntry>,
}

impl ZipArchive {
    /// Parse a complete archive buffer into an indexed archive.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the trailer cannot be located or the
    /// central directory is inconsistent with the buffer (truncated data,
    /// bad signatures, out-of-range offsets).
    pub fn parse(data: Bytes) -> Result<Self, ParseError> {
        let (eocd, eocd_offset) = find_eocd(&data)?;

        // Get Central Directory info, using ZIP64 if needed
        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = read_zip64_eocd(&data, eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let out_of_bounds = || ParseError::DirectoryOutOfBounds {
            offset: cd_offset,
            size: cd_size,
            archive_size: data.len() as u64,
        };
        let cd_end = cd_offset.checked_add(cd_size).ok_or_else(out_of_bounds)?;
        if cd_end > data.len() as u64 {
            return Err(out_of_bounds());
        }
        let cd_data = &data[cd_offset as usize..cd_end as usize];

        // The declared entry count cannot exceed what fits in the directory
        let capacity = total_entries.min(cd_size / CDFH_MIN_SIZE as u64) as usize;
        let mut entries = Vec::with_capacity(capacity);
        let mut cursor = Cursor::new(cd_data);

        for _ in 0..total_entries {
            let entry = parse_cdfh(&mut cursor)?;
            entries.push(entry);
        }

        Ok(Self { data, entries })
    }

    /// All entries, in the archive's original directory order.
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Raw archive bytes, for resolving entry data during extraction.
    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Find and parse the End of Central Directory record.
///
/// The EOCD sits at the end of the buffer. The simple case (no archive
/// comment) is checked first; otherwise the tail of the buffer is searched
/// backwards for the signature, validating the comment length of each
/// candidate.
///
/// Returns the EOCD record and its offset within the buffer.
fn find_eocd(data: &[u8]) -> Result<(EndOfCentralDirectory, u64), ParseError> {
    // Fast path: no comment, EOCD is the last 22 bytes.
    if data.len() >= EndOfCentralDirectory::SIZE {
        let offset = data.len() - EndOfCentralDirectory::SIZE;
        let tail = &data[offset..];

        if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && &tail[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(tail)?;
            return Ok((eocd, offset as u64));
        }
    }

    // EOCD not at expected location - search for it.
    // The EOCD could be earlier if there's a ZIP comment.
    let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE).min(data.len());
    let search_start = data.len() - search_size;
    let buf = &data[search_start..];

    // Search backwards for EOCD signature (PK\x05\x06)
    for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
        if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
            // Found a potential EOCD - the comment length field must match
            // the remaining bytes for this to be the real one.
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, (search_start + i) as u64));
            }
        }
    }

    Err(ParseError::EocdNotFound)
}

/// Read the ZIP64 End of Central Directory record.
///
/// Called when the regular EOCD carries sentinel values (0xFFFF or
/// 0xFFFFFFFF) that indicate ZIP64 extensions are in use.
fn read_zip64_eocd(data: &[u8], eocd_offset: u64) -> Result<Zip64EOCD, ParseError> {
    // The ZIP64 EOCD Locator sits immediately before the regular EOCD
    let locator_offset = eocd_offset
        .checked_sub(Zip64EOCDLocator::SIZE as u64)
        .ok_or(ParseError::InvalidZip64)? as usize;
    let locator =
        Zip64EOCDLocator::from_bytes(&data[locator_offset..locator_offset + Zip64EOCDLocator::SIZE])?;

    // Read the actual ZIP64 EOCD from the offset specified in the locator
    let eocd64_offset = locator.eocd64_offset as usize;
    let eocd64_end = eocd64_offset
        .checked_add(Zip64EOCD::MIN_SIZE)
        .filter(|end| *end <= data.len())
        .ok_or(ParseError::InvalidZip64)?;

    Zip64EOCD::from_bytes(&data[eocd64_offset..eocd64_end])
}

/// Parse one Central Directory File Header from a cursor.
///
/// The CDFH carries the entry's name, sizes, and the location of the
/// entry's local header; ZIP64 extra fields override the 32-bit size and
/// offset fields when they are saturated.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry, ParseError> {
    // Read and verify the signature (PK\x01\x02)
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(ParseError::InvalidHeader);
    }

    // Read fixed-size header fields
    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    // Read the variable-length file name
    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    // Use lossy conversion to handle non-UTF8 filenames gracefully
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

    // Directory entries end with '/'
    let is_directory = file_name.ends_with('/');

    // Parse extra field for ZIP64 extended information
    // ZIP64 uses extra field ID 0x0001
    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;

        if header_id == 0x0001 {
            // ZIP64 extended information extra field
            // Fields are present only if corresponding header field is 0xFFFFFFFF
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
            // Skip any remaining ZIP64 fields (disk number start)
            let remaining = extra_field_end.saturating_sub(cursor.position());
            cursor.set_position(cursor.position() + remaining);
        } else {
            // Skip unknown extra fields
            cursor.set_position(cursor.position() + field_size as u64);
        }
    }

    // Ensure cursor is positioned after extra field
    cursor.set_position(extra_field_end);

    // Skip over the file comment (we don't use it)
    cursor.set_position(cursor.position() + file_comment_length as u64);

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        is_directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::testdata::ZipBuilder;

    #[test]
    fn parse_lists_entries_in_directory_order() {
        let data = ZipBuilder::new()
            .stored("readme.txt", b"hello")
            .directory("docs/")
            .deflated("docs/guide.md", b"a guide, repeated a guide, repeated")
            .build();

        let archive = ZipArchive::parse(data).unwrap();
        let names: Vec<&str> = archive
            .entries()
            .iter()
            .map(|e| e.file_name.as_str())
            .collect();
        assert_eq!(names, ["readme.txt", "docs/", "docs/guide.md"]);
        assert!(archive.entries()[1].is_directory);
        assert_eq!(archive.entries()[0].uncompressed_size, 5);
    }

    #[test]
    fn parse_empty_archive_yields_no_entries() {
        let data = ZipBuilder::new().build();
        let archive = ZipArchive::parse(data).unwrap();
        assert!(archive.entries().is_empty());
    }

    #[test]
    fn parse_tolerates_archive_comment() {
        let data = ZipBuilder::new()
            .stored("a.txt", b"a")
            .comment("built by the nightly batch job")
            .build();

        let archive = ZipArchive::parse(data).unwrap();
        assert_eq!(archive.entries().len(), 1);
        assert_eq!(archive.entries()[0].file_name, "a.txt");
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = ZipArchive::parse(Bytes::from_static(b"definitely not a zip archive")).unwrap_err();
        assert!(matches!(err, ParseError::EocdNotFound));
    }

    #[test]
    fn parse_rejects_truncated_buffer() {
        let data = ZipBuilder::new().stored("a.txt", b"some contents").build();
        let cut = data.slice(..data.len() - 7);
        assert!(ZipArchive::parse(cut).is_err());
    }

    #[test]
    fn parse_rejects_directory_past_end_of_buffer() {
        let data = ZipBuilder::new().stored("a.txt", b"abc").build();
        // Corrupt the EOCD's central directory offset so it points past the end
        let mut raw = data.to_vec();
        let eocd_offset = raw.len() - 22;
        raw[eocd_offset + 16..eocd_offset + 20].copy_from_slice(&u32::MAX.to_le_bytes());
        // Offset of 0xFFFFFFFF reads as a ZIP64 sentinel with no ZIP64 record
        assert!(ZipArchive::parse(Bytes::from(raw)).is_err());

        let mut raw = data.to_vec();
        raw[eocd_offset + 16..eocd_offset + 20].copy_from_slice(&100_000u32.to_le_bytes());
        let err = ZipArchive::parse(Bytes::from(raw)).unwrap_err();
        assert!(matches!(err, ParseError::DirectoryOutOfBounds { .. }));
    }

    #[test]
    fn parse_rejects_corrupted_directory_signature() {
        let data = ZipBuilder::new().stored("a.txt", b"abc").build();
        let mut raw = data.to_vec();
        let eocd_offset = raw.len() - 22;
        let cd_offset =
            u32::from_le_bytes(raw[eocd_offset + 16..eocd_offset + 20].try_into().unwrap()) as usize;
        raw[cd_offset] = b'X';
        let err = ZipArchive::parse(Bytes::from(raw)).unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeader));
    }
}
