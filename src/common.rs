//! Common types and error definitions for idxquery
//!
//! This module contains the identifier aliases, the crate error type and the
//! query configuration used throughout the read path.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Document identifier, scoped to a single index file.
pub type DocId = u64;

/// Byte position within an index file.
/// Offsets are opaque handles: they are only ever resolved through a read
/// against the file they came from.
pub type FileOffset = u64;

/// 64-bit digest used to place an element in a bucket.
pub type HashKey = u64;

/// Error types for index read operations
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// A read ran past the end of the index file
    #[error("Truncated index: cannot read {len} bytes at offset {offset}")]
    Truncated { offset: FileOffset, len: usize },

    #[error("Bad magic number: 0x{found:08x}")]
    BadMagic { found: u32 },

    #[error("Checksum mismatch: header says 0x{expected:08x}, contents hash to 0x{found:08x}")]
    ChecksumMismatch { expected: u32, found: u32 },

    /// Structural inconsistency inside the file
    #[error("Data corruption detected: {message}")]
    Corruption { message: String },

    /// A postings entry references a document absent from the doc table
    #[error("Document {doc_id} is referenced by postings but missing from the document table")]
    MissingDocument { doc_id: DocId },

    #[error("Query must contain at least one word")]
    EmptyQuery,

    #[error("At least one index file is required")]
    NoIndexFiles,

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl IndexError {
    pub(crate) fn corruption(message: impl Into<String>) -> Self {
        IndexError::Corruption {
            message: message.into(),
        }
    }

    /// Check if this error indicates a damaged or inconsistent index file
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            IndexError::Truncated { .. }
                | IndexError::BadMagic { .. }
                | IndexError::ChecksumMismatch { .. }
                | IndexError::Corruption { .. }
                | IndexError::MissingDocument { .. }
        )
    }

    /// Check if this error was caused by the shape of the caller's request
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            IndexError::EmptyQuery | IndexError::NoIndexFiles | IndexError::InvalidConfig { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            IndexError::Io(_) => "io",
            IndexError::Truncated { .. } => "truncated",
            IndexError::BadMagic { .. } | IndexError::ChecksumMismatch { .. } => "integrity",
            IndexError::Corruption { .. } => "corruption",
            IndexError::MissingDocument { .. } => "consistency",
            IndexError::EmptyQuery | IndexError::NoIndexFiles => "query_shape",
            IndexError::InvalidConfig { .. } => "configuration",
        }
    }
}

/// Result type alias for idxquery operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Configuration for a query session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Index files to open, in the order their results are reported
    pub index_paths: Vec<PathBuf>,
    /// Treat integrity and consistency anomalies as fatal
    pub validate: bool,
    /// Read index files through a read-only memory map instead of seek+read
    pub use_mmap: bool,
}

impl QueryConfig {
    /// Strict configuration over the given files
    pub fn strict<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            index_paths: paths.into_iter().map(Into::into).collect(),
            validate: true,
            ..Self::default()
        }
    }

    /// Lenient configuration over the given files
    pub fn lenient<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            index_paths: paths.into_iter().map(Into::into).collect(),
            validate: false,
            ..Self::default()
        }
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.index_paths.is_empty() {
            return Err(IndexError::NoIndexFiles);
        }

        if let Some(pos) = self
            .index_paths
            .iter()
            .position(|p| p.as_os_str().is_empty())
        {
            return Err(IndexError::InvalidConfig {
                message: format!("Index path #{pos} is empty"),
            });
        }

        Ok(())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            index_paths: Vec::new(),
            validate: true,
            use_mmap: false,
        }
    }
}
