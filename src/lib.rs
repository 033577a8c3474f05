//! # idxquery: the read path of a disk-resident inverted index
//!
//! `idxquery` answers multi-word AND queries over one or more immutable index
//! files. Each file stores two bucket-chained hash tables in a packed
//! big-endian layout: a document table (id to path) and a word table (word
//! to postings).
//!
//! ## Components
//!
//! - **Layout**: fixed-size wire records and byte-order conversion
//! - **Storage**: independently positioned byte sources over a file
//! - **Index readers**: bucket table, document table and word table lookups
//! - **Index files**: header validation and reader construction
//! - **Query processor**: per-file intersection and ranked output
//!
//! ## Example
//!
//! ```rust,ignore
//! use idxquery::QueryProcessor;
//!
//! fn main() -> idxquery::Result<()> {
//!     let qp = QueryProcessor::new(&["enron.idx", "books.idx"], true)?;
//!     for row in qp.process_query(&["rain", "spain"])? {
//!         println!("{} ({})", row.document_name, row.rank);
//!     }
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod hash;
pub mod index;
pub mod index_file;
pub mod layout;
pub mod query;
pub mod storage;

#[cfg(test)]
mod test_util;

// Re-export commonly used types
pub use common::{DocId, FileOffset, HashKey, IndexError, QueryConfig, Result};
pub use index::{BucketTableReader, DocumentTableReader, PostingList, WordTableReader};
pub use index_file::IndexFileReader;
pub use layout::{FileHeader, MAGIC_NUMBER, PostingEntry};
pub use query::{QueryProcessor, QueryResult};
pub use storage::{FileSource, IndexSource, MmapSource};
