//! In-memory ZIP fixtures for the test suite.
//!
//! Assembles real local file headers, central directory records, and an
//! EOCD with `byteorder`, so tests exercise the same byte layout the
//! parser sees in production archives. Nothing here touches disk or
//! network.

use byteorder::{LittleEndian, WriteBytesExt};
use bytes::Bytes;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use super::structures::{CDFH_SIGNATURE, EndOfCentralDirectory, LFH_SIGNATURE};

struct PendingEntry {
    name: String,
    method: u16,
    crc32: u32,
    compressed: Vec<u8>,
    uncompressed_size: u32,
    lfh_offset: u32,
}

/// Builds a syntactically valid ZIP archive entry by entry.
///
/// `raw` lets a test declare sizes and payloads that disagree, to exercise
/// the corrupt-entry paths without hand-editing offsets.
pub(crate) struct ZipBuilder {
    data: Vec<u8>,
    entries: Vec<PendingEntry>,
    comment: String,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            entries: Vec::new(),
            comment: String::new(),
        }
    }

    /// Add an uncompressed (STORED) entry.
    pub fn stored(self, name: &str, contents: &[u8]) -> Self {
        let crc = Self::crc32(contents);
        self.push(name, 0, crc, contents.to_vec(), contents.len() as u32)
    }

    /// Add a DEFLATE-compressed entry.
    pub fn deflated(self, name: &str, contents: &[u8]) -> Self {
        let crc = Self::crc32(contents);
        let compressed = Self::deflate(contents);
        self.push(name, 8, crc, compressed, contents.len() as u32)
    }

    /// Add a directory entry (name must end in '/').
    pub fn directory(self, name: &str) -> Self {
        assert!(name.ends_with('/'));
        self.push(name, 0, 0, Vec::new(), 0)
    }

    /// Add an entry with full control over method, checksum, payload, and
    /// the declared uncompressed size.
    pub fn raw(
        self,
        name: &str,
        method: u16,
        crc32: u32,
        payload: &[u8],
        uncompressed_size: u32,
    ) -> Self {
        self.push(name, method, crc32, payload.to_vec(), uncompressed_size)
    }

    /// Set the archive comment stored after the EOCD.
    pub fn comment(mut self, text: &str) -> Self {
        self.comment = text.to_string();
        self
    }

    pub fn deflate(contents: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(contents).unwrap();
        encoder.finish().unwrap()
    }

    fn crc32(contents: &[u8]) -> u32 {
        let mut crc = flate2::Crc::new();
        crc.update(contents);
        crc.sum()
    }

    fn push(
        mut self,
        name: &str,
        method: u16,
        crc32: u32,
        compressed: Vec<u8>,
        uncompressed_size: u32,
    ) -> Self {
        let lfh_offset = self.data.len() as u32;

        // Local file header, then the entry data
        self.data.extend_from_slice(LFH_SIGNATURE);
        self.data.write_u16::<LittleEndian>(20).unwrap(); // version needed
        self.data.write_u16::<LittleEndian>(0).unwrap(); // flags
        self.data.write_u16::<LittleEndian>(method).unwrap();
        self.data.write_u16::<LittleEndian>(0).unwrap(); // mod time
        self.data.write_u16::<LittleEndian>(0).unwrap(); // mod date
        self.data.write_u32::<LittleEndian>(crc32).unwrap();
        self.data
            .write_u32::<LittleEndian>(compressed.len() as u32)
            .unwrap();
        self.data
            .write_u32::<LittleEndian>(uncompressed_size)
            .unwrap();
        self.data
            .write_u16::<LittleEndian>(name.len() as u16)
            .unwrap();
        self.data.write_u16::<LittleEndian>(0).unwrap(); // extra length
        self.data.extend_from_slice(name.as_bytes());
        self.data.extend_from_slice(&compressed);

        self.entries.push(PendingEntry {
            name: name.to_string(),
            method,
            crc32,
            compressed,
            uncompressed_size,
            lfh_offset,
        });
        self
    }

    pub fn build(mut self) -> Bytes {
        let cd_offset = self.data.len() as u32;

        for entry in &self.entries {
            self.data.extend_from_slice(CDFH_SIGNATURE);
            self.data.write_u16::<LittleEndian>(20).unwrap(); // version made by
            self.data.write_u16::<LittleEndian>(20).unwrap(); // version needed
            self.data.write_u16::<LittleEndian>(0).unwrap(); // flags
            self.data.write_u16::<LittleEndian>(entry.method).unwrap();
            self.data.write_u16::<LittleEndian>(0).unwrap(); // mod time
            self.data.write_u16::<LittleEndian>(0).unwrap(); // mod date
            self.data.write_u32::<LittleEndian>(entry.crc32).unwrap();
            self.data
                .write_u32::<LittleEndian>(entry.compressed.len() as u32)
                .unwrap();
            self.data
                .write_u32::<LittleEndian>(entry.uncompressed_size)
                .unwrap();
            self.data
                .write_u16::<LittleEndian>(entry.name.len() as u16)
                .unwrap();
            self.data.write_u16::<LittleEndian>(0).unwrap(); // extra length
            self.data.write_u16::<LittleEndian>(0).unwrap(); // comment length
            self.data.write_u16::<LittleEndian>(0).unwrap(); // disk number
            self.data.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
            self.data.write_u32::<LittleEndian>(0).unwrap(); // external attrs
            self.data
                .write_u32::<LittleEndian>(entry.lfh_offset)
                .unwrap();
            self.data.extend_from_slice(entry.name.as_bytes());
        }

        let cd_size = self.data.len() as u32 - cd_offset;
        let total = self.entries.len() as u16;

        self.data
            .extend_from_slice(EndOfCentralDirectory::SIGNATURE);
        self.data.write_u16::<LittleEndian>(0).unwrap(); // disk number
        self.data.write_u16::<LittleEndian>(0).unwrap(); // disk with cd
        self.data.write_u16::<LittleEndian>(total).unwrap();
        self.data.write_u16::<LittleEndian>(total).unwrap();
        self.data.write_u32::<LittleEndian>(cd_size).unwrap();
        self.data.write_u32::<LittleEndian>(cd_offset).unwrap();
        self.data
            .write_u16::<LittleEndian>(self.comment.len() as u16)
            .unwrap();
        self.data.extend_from_slice(self.comment.as_bytes());

        Bytes::from(self.data)
    }
}
