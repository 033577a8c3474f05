//! On-disk record layout for index files
//!
//! Every record is a packed, fixed-size run of big-endian integers. Records
//! are converted between wire and host order at the read boundary and never
//! reinterpreted in place.
//!
//! ```text
//! offset 0   FileHeader          magic u32 | checksum u32 | doc_table u64 | word_table u64
//! region     BucketTableHeader   bucket_count u32
//!            BucketSlot * n      chain_length u32 | chain_offset u64
//! chain      ChainEntry * len    element_offset u64
//! element    DocumentRecord      doc_id u64 | path_len u16 | path bytes
//! element    WordRecord          word_len u16 | posting_count u32 | word bytes | PostingEntry * count
//!            PostingEntry        doc_id u64 | occurrence_count u32
//! ```

use crate::common::{DocId, FileOffset};

/// Magic number stored at the start of every index file.
pub const MAGIC_NUMBER: u32 = 0xCAFE_F00D;

/// Size of the largest fixed record, used for stack read buffers.
pub const MAX_RECORD_SIZE: usize = FileHeader::SIZE;

/// A fixed-size record with a big-endian wire representation.
pub trait WireRecord: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Decodes the record from exactly `SIZE` bytes.
    fn from_wire(buf: &[u8]) -> Self;

    /// Appends the `SIZE`-byte encoding of the record to `out`.
    fn to_wire(&self, out: &mut Vec<u8>);
}

#[inline]
fn be_u16(buf: &[u8], at: usize) -> u16 {
    let mut bytes = [0u8; 2];
    bytes.copy_from_slice(&buf[at..at + 2]);
    u16::from_be_bytes(bytes)
}

#[inline]
fn be_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_be_bytes(bytes)
}

#[inline]
fn be_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_be_bytes(bytes)
}

/// File-level header at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: u32,
    /// CRC-32 of every byte following the header
    pub checksum: u32,
    pub doc_table_offset: FileOffset,
    pub word_table_offset: FileOffset,
}

impl WireRecord for FileHeader {
    const SIZE: usize = 24;

    fn from_wire(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), Self::SIZE);
        Self {
            magic: be_u32(buf, 0),
            checksum: be_u32(buf, 4),
            doc_table_offset: be_u64(buf, 8),
            word_table_offset: be_u64(buf, 16),
        }
    }

    fn to_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.magic.to_be_bytes());
        out.extend_from_slice(&self.checksum.to_be_bytes());
        out.extend_from_slice(&self.doc_table_offset.to_be_bytes());
        out.extend_from_slice(&self.word_table_offset.to_be_bytes());
    }
}

/// Header of one hash-table region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketTableHeader {
    pub bucket_count: u32,
}

impl WireRecord for BucketTableHeader {
    const SIZE: usize = 4;

    fn from_wire(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), Self::SIZE);
        Self {
            bucket_count: be_u32(buf, 0),
        }
    }

    fn to_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.bucket_count.to_be_bytes());
    }
}

/// Chain descriptor for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BucketSlot {
    pub chain_length: u32,
    pub chain_offset: FileOffset,
}

impl WireRecord for BucketSlot {
    const SIZE: usize = 12;

    fn from_wire(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), Self::SIZE);
        Self {
            chain_length: be_u32(buf, 0),
            chain_offset: be_u64(buf, 4),
        }
    }

    fn to_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.chain_length.to_be_bytes());
        out.extend_from_slice(&self.chain_offset.to_be_bytes());
    }
}

/// Location of one element of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    pub element_offset: FileOffset,
}

impl WireRecord for ChainEntry {
    const SIZE: usize = 8;

    fn from_wire(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), Self::SIZE);
        Self {
            element_offset: be_u64(buf, 0),
        }
    }

    fn to_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.element_offset.to_be_bytes());
    }
}

/// Fixed part of a document-table element; `path_len` path bytes follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRecordHeader {
    pub doc_id: DocId,
    pub path_len: u16,
}

impl WireRecord for DocumentRecordHeader {
    const SIZE: usize = 10;

    fn from_wire(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), Self::SIZE);
        Self {
            doc_id: be_u64(buf, 0),
            path_len: be_u16(buf, 8),
        }
    }

    fn to_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.doc_id.to_be_bytes());
        out.extend_from_slice(&self.path_len.to_be_bytes());
    }
}

/// Fixed part of a word-table element; the word bytes and then
/// `posting_count` [`PostingEntry`] records follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRecordHeader {
    pub word_len: u16,
    pub posting_count: u32,
}

impl WordRecordHeader {
    /// Bytes occupied by the postings that follow the word.
    pub fn postings_len(&self) -> u64 {
        self.posting_count as u64 * PostingEntry::SIZE as u64
    }
}

impl WireRecord for WordRecordHeader {
    const SIZE: usize = 6;

    fn from_wire(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), Self::SIZE);
        Self {
            word_len: be_u16(buf, 0),
            posting_count: be_u32(buf, 2),
        }
    }

    fn to_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.word_len.to_be_bytes());
        out.extend_from_slice(&self.posting_count.to_be_bytes());
    }
}

/// One document's hit count for a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingEntry {
    pub doc_id: DocId,
    pub occurrence_count: u32,
}

impl WireRecord for PostingEntry {
    const SIZE: usize = 12;

    fn from_wire(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), Self::SIZE);
        Self {
            doc_id: be_u64(buf, 0),
            occurrence_count: be_u32(buf, 8),
        }
    }

    fn to_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.doc_id.to_be_bytes());
        out.extend_from_slice(&self.occurrence_count.to_be_bytes());
    }
}
