//! Index file opening and validation
//!
//! An [`IndexFileReader`] reads and checks the file header, then hands out
//! table readers. Every table reader gets its own freshly opened source onto
//! the file, so interleaved lookups never disturb each other's position. A
//! reopened source must have the identity of the validated file.

use std::path::{Path, PathBuf};

use crate::common::{FileOffset, IndexError, Result};
use crate::index::{BucketTableReader, DocumentTableReader, WordTableReader};
use crate::layout::{BucketTableHeader, FileHeader, MAGIC_NUMBER, WireRecord};
use crate::storage::{FileIdentity, IndexSource, open_source, read_record};

/// Bytes hashed per read while verifying the checksum
const CHECKSUM_CHUNK: usize = 64 * 1024;

/// One opened index file
pub struct IndexFileReader {
    path: PathBuf,
    header: FileHeader,
    identity: FileIdentity,
    use_mmap: bool,
}

impl IndexFileReader {
    /// Open `path` and read its header.
    ///
    /// With `validate` set, a wrong magic number or checksum is fatal.
    /// Without it, a wrong magic number is logged and the checksum is not
    /// computed. Region offsets that fall outside the file are always fatal.
    pub fn open<P: AsRef<Path>>(path: P, validate: bool, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let source = open_source(&path, use_mmap)?;
        let identity = source.identity();
        let file_len = source.len();
        let header: FileHeader = read_record(source.as_ref(), 0)?;

        if header.magic != MAGIC_NUMBER {
            if validate {
                return Err(IndexError::BadMagic {
                    found: header.magic,
                });
            }
            log::warn!(
                "{}: bad magic number 0x{:08x}, continuing without validation",
                path.display(),
                header.magic
            );
        }

        for (name, offset) in [
            ("document", header.doc_table_offset),
            ("word", header.word_table_offset),
        ] {
            check_region(name, offset, file_len)?;
        }

        if validate {
            let found = checksum(source.as_ref())?;
            if found != header.checksum {
                return Err(IndexError::ChecksumMismatch {
                    expected: header.checksum,
                    found,
                });
            }
        }

        log::info!(
            "Opened index {} ({file_len} bytes, doc table @{}, word table @{})",
            path.display(),
            header.doc_table_offset,
            header.word_table_offset
        );

        Ok(Self {
            path,
            header,
            identity,
            use_mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn file_len(&self) -> u64 {
        self.identity.len()
    }

    fn open_table(&self, base_offset: FileOffset) -> Result<BucketTableReader> {
        let source = open_source(&self.path, self.use_mmap)?;
        if source.identity() != self.identity {
            return Err(IndexError::corruption(format!(
                "{} was replaced or modified after it was opened",
                self.path.display()
            )));
        }
        BucketTableReader::open(source, base_offset)
    }

    pub fn new_document_table_reader(&self) -> Result<DocumentTableReader> {
        Ok(DocumentTableReader::new(
            self.open_table(self.header.doc_table_offset)?,
        ))
    }

    pub fn new_word_table_reader(&self) -> Result<WordTableReader> {
        Ok(WordTableReader::new(
            self.open_table(self.header.word_table_offset)?,
        ))
    }
}

fn check_region(name: &str, offset: FileOffset, file_len: u64) -> Result<()> {
    let fits = offset >= FileHeader::SIZE as u64
        && offset
            .checked_add(BucketTableHeader::SIZE as u64)
            .is_some_and(|end| end <= file_len);
    if fits {
        Ok(())
    } else {
        Err(IndexError::corruption(format!(
            "{name} table offset {offset} lies outside the file ({file_len} bytes)"
        )))
    }
}

/// CRC-32 of everything after the file header.
fn checksum(source: &dyn IndexSource) -> Result<u32> {
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; CHECKSUM_CHUNK];
    let mut offset = FileHeader::SIZE as u64;
    let end = source.len();

    while offset < end {
        let len = (end - offset).min(CHECKSUM_CHUNK as u64) as usize;
        source.read_exact_at(offset, &mut buf[..len])?;
        hasher.update(&buf[..len]);
        offset += len as u64;
    }

    Ok(hasher.finalize())
}
