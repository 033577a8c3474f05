use crate::common::{DocId, IndexError, Result};
use crate::hash::doc_key;
use crate::index::bucket_table::BucketTableReader;
use crate::layout::{DocumentRecordHeader, WireRecord};
use crate::storage::{read_bytes, read_record};

/// Resolves document ids to document paths through the document table.
pub struct DocumentTableReader {
    table: BucketTableReader,
}

impl DocumentTableReader {
    pub fn new(table: BucketTableReader) -> Self {
        Self { table }
    }

    /// Path of `doc_id`, or `None` if no record in its bucket carries that id.
    pub fn lookup(&self, doc_id: DocId) -> Result<Option<String>> {
        for element_offset in self.table.lookup(doc_key(doc_id))? {
            let header: DocumentRecordHeader = read_record(self.table.source(), element_offset)?;
            if header.doc_id != doc_id {
                // Another document hashed into the same bucket
                continue;
            }

            let path_offset = element_offset + DocumentRecordHeader::SIZE as u64;
            let bytes = read_bytes(self.table.source(), path_offset, header.path_len as usize)?;
            let path = String::from_utf8(bytes).map_err(|_| {
                IndexError::corruption(format!(
                    "{}: document {doc_id} at offset {element_offset} has a non UTF-8 path",
                    self.table.source().path().display()
                ))
            })?;
            return Ok(Some(path));
        }

        Ok(None)
    }

    /// Path of `doc_id` for a postings entry that must have a document.
    ///
    /// A miss is [`IndexError::MissingDocument`] when `validate` is set;
    /// otherwise a placeholder name is returned and the miss is logged.
    pub fn resolve(&self, doc_id: DocId, validate: bool) -> Result<String> {
        match self.lookup(doc_id)? {
            Some(path) => Ok(path),
            None if validate => Err(IndexError::MissingDocument { doc_id }),
            None => {
                log::warn!("Document {doc_id} missing from document table, using placeholder");
                Ok(missing_document_name(doc_id))
            }
        }
    }
}

/// Name reported for a document the document table does not contain.
pub fn missing_document_name(doc_id: DocId) -> String {
    format!("<missing document {doc_id}>")
}
