//! Readers over the bucket-chained hash tables stored in an index file.
//!
//! [`BucketTableReader`] turns a hash key into element offsets; the document
//! and word table readers decode the elements behind those offsets and reject
//! candidates whose stored key does not match.

pub mod bucket_table;
pub mod doc_table;
pub mod word_table;

pub use bucket_table::BucketTableReader;
pub use doc_table::DocumentTableReader;
pub use word_table::{PostingList, WordTableReader};
