//! Byte sources backing the index readers
//!
//! Each logical reader owns its own source, opened independently from the
//! index path, so no two readers ever share a file cursor. A source records
//! the [`FileIdentity`] it was opened on, which lets the opener confirm that
//! every reopened handle still refers to the file it validated.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use memmap2::{Mmap, MmapOptions};
use parking_lot::Mutex;

use crate::common::{FileOffset, IndexError, Result};
use crate::layout::{MAX_RECORD_SIZE, WireRecord};

/// Read-only random access to the bytes of one index file
pub trait IndexSource: Send + Sync {
    /// Fill `buf` with the bytes starting at `offset`.
    /// Fails with [`IndexError::Truncated`] if the source ends first.
    fn read_exact_at(&self, offset: FileOffset, buf: &mut [u8]) -> Result<()>;

    /// Total size of the source in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path the source was opened from
    fn path(&self) -> &Path;

    /// Identity of the underlying file at open time
    fn identity(&self) -> FileIdentity;
}

/// Identifies one concrete file independently of the path naming it.
/// Two handles onto the same file compare equal; a file renamed over the
/// path does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    len: u64,
    modified: Option<SystemTime>,
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
}

impl FileIdentity {
    pub fn of(file: &File) -> Result<Self> {
        let metadata = file.metadata()?;

        Ok(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
            #[cfg(unix)]
            dev: std::os::unix::fs::MetadataExt::dev(&metadata),
            #[cfg(unix)]
            ino: std::os::unix::fs::MetadataExt::ino(&metadata),
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Decode one fixed-size record at `offset`.
pub fn read_record<R: WireRecord>(source: &dyn IndexSource, offset: FileOffset) -> Result<R> {
    let mut buf = [0u8; MAX_RECORD_SIZE];
    let buf = &mut buf[..R::SIZE];
    source.read_exact_at(offset, buf)?;
    Ok(R::from_wire(buf))
}

/// Read `len` raw bytes at `offset`.
pub fn read_bytes(source: &dyn IndexSource, offset: FileOffset, len: usize) -> Result<Vec<u8>> {
    check_extent(source, offset, len as u64)?;
    let mut buf = vec![0u8; len];
    source.read_exact_at(offset, &mut buf)?;
    Ok(buf)
}

/// Fail with [`IndexError::Truncated`] unless `[offset, offset + len)` lies
/// inside the source.
pub fn check_extent(source: &dyn IndexSource, offset: FileOffset, len: u64) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= source.len() => Ok(()),
        _ => Err(IndexError::Truncated {
            offset,
            len: len.try_into().unwrap_or(usize::MAX),
        }),
    }
}

/// File-based source: seek then read under a lock on a private handle
pub struct FileSource {
    file: Mutex<File>,
    path: PathBuf,
    identity: FileIdentity,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let identity = FileIdentity::of(&file)?;

        Ok(Self {
            file: Mutex::new(file),
            path,
            identity,
        })
    }
}

impl IndexSource for FileSource {
    fn read_exact_at(&self, offset: FileOffset, buf: &mut [u8]) -> Result<()> {
        let len = buf.len();
        // Out-of-range offsets must not reach the seek: large ones fail there
        // as plain I/O errors instead of truncation
        check_extent(self, offset, len as u64)?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => IndexError::Truncated { offset, len },
            _ => IndexError::Io(e),
        })
    }

    fn len(&self) -> u64 {
        self.identity.len()
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn identity(&self) -> FileIdentity {
        self.identity
    }
}

/// Memory-mapped source over a read-only mapping of the whole file
pub struct MmapSource {
    mmap: Option<Mmap>,
    path: PathBuf,
    identity: FileIdentity,
}

impl MmapSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let identity = FileIdentity::of(&file)?;

        // Zero-length files cannot be mapped on every platform
        let mmap = if identity.is_empty() {
            None
        } else {
            let len = mappable_len(identity.len())?;
            Some(unsafe { MmapOptions::new().len(len).map(&file)? })
        };

        Ok(Self {
            mmap,
            path,
            identity,
        })
    }
}

/// File size as a mapping length; fails where the address space is smaller
/// than the file.
fn mappable_len(size: u64) -> Result<usize> {
    usize::try_from(size).map_err(|_| {
        IndexError::Io(std::io::Error::new(
            ErrorKind::Unsupported,
            format!("{size} byte file does not fit in the address space"),
        ))
    })
}

impl IndexSource for MmapSource {
    fn read_exact_at(&self, offset: FileOffset, buf: &mut [u8]) -> Result<()> {
        let len = buf.len();
        let truncated = || IndexError::Truncated { offset, len };
        let bytes = self.mmap.as_deref().unwrap_or(&[]);
        let start = usize::try_from(offset).map_err(|_| truncated())?;
        let end = start.checked_add(len).ok_or_else(truncated)?;
        let slice = bytes.get(start..end).ok_or_else(truncated)?;
        buf.copy_from_slice(slice);
        Ok(())
    }

    fn len(&self) -> u64 {
        self.mmap.as_ref().map_or(0, |m| m.len() as u64)
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn identity(&self) -> FileIdentity {
        self.identity
    }
}

/// Open a fresh, independently positioned source onto `path`.
pub fn open_source(path: &Path, use_mmap: bool) -> Result<Box<dyn IndexSource>> {
    if use_mmap {
        Ok(Box::new(MmapSource::open(path)?))
    } else {
        Ok(Box::new(FileSource::open(path)?))
    }
}
