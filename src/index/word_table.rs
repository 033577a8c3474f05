use crate::common::{DocId, IndexError, Result};
use crate::hash::word_key;
use crate::index::bucket_table::BucketTableReader;
use crate::layout::{PostingEntry, WireRecord, WordRecordHeader};
use crate::storage::{check_extent, read_bytes, read_record};

/// Postings of one word within one index file, in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingList {
    word: String,
    entries: Vec<PostingEntry>,
}

impl PostingList {
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn entries(&self) -> &[PostingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Occurrence count of the first entry for `doc_id`.
    pub fn occurrences(&self, doc_id: DocId) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.doc_id == doc_id)
            .map(|e| e.occurrence_count)
    }

    pub fn total_occurrences(&self) -> u64 {
        self.entries.iter().map(|e| e.occurrence_count as u64).sum()
    }

    pub fn into_entries(self) -> Vec<PostingEntry> {
        self.entries
    }
}

/// Resolves normalized words to their postings through the word table.
pub struct WordTableReader {
    table: BucketTableReader,
}

impl WordTableReader {
    pub fn new(table: BucketTableReader) -> Self {
        Self { table }
    }

    /// Postings for `word`, or `None` if the word is not in this file's
    /// vocabulary. The word must already be normalized.
    pub fn lookup(&self, word: &str) -> Result<Option<PostingList>> {
        let source = self.table.source();

        for element_offset in self.table.lookup(word_key(word))? {
            let header: WordRecordHeader = read_record(source, element_offset)?;
            if header.word_len as usize != word.len() {
                continue;
            }

            let word_offset = element_offset + WordRecordHeader::SIZE as u64;
            let stored = read_bytes(source, word_offset, header.word_len as usize)?;
            if stored != word.as_bytes() {
                // Another word hashed into the same bucket
                continue;
            }

            let postings_offset = word_offset + header.word_len as u64;
            check_extent(source, postings_offset, header.postings_len()).map_err(|_| {
                IndexError::corruption(format!(
                    "{}: postings of {word:?} ({} entries at offset {postings_offset}) overrun the file",
                    source.path().display(),
                    header.posting_count
                ))
            })?;

            let mut entries = Vec::with_capacity(header.posting_count as usize);
            let mut entry_offset = postings_offset;
            for _ in 0..header.posting_count {
                entries.push(read_record::<PostingEntry>(source, entry_offset)?);
                entry_offset += PostingEntry::SIZE as u64;
            }

            return Ok(Some(PostingList {
                word: word.to_string(),
                entries,
            }));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_file::IndexFileReader;
    use crate::storage::open_source;
    use crate::test_util::{IndexFixture, TableBuilder, temp_file};

    fn reader_for(fixture: IndexFixture) -> (tempfile::TempDir, WordTableReader) {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture.write_to(dir.path(), "words.idx");
        let index = IndexFileReader::open(&path, true, false).unwrap();
        let reader = index.new_word_table_reader().unwrap();
        (dir, reader)
    }

    #[test]
    fn test_lookup_returns_postings_in_disk_order() {
        let (_dir, words) = reader_for(
            IndexFixture::new()
                .posting("fox", 9, 1)
                .posting("fox", 2, 7)
                .posting("fox", 5, 3)
                .posting("dog", 2, 1),
        );

        let fox = words.lookup("fox").unwrap().unwrap();
        assert_eq!(fox.word(), "fox");
        let ids: Vec<_> = fox.entries().iter().map(|e| e.doc_id).collect();
        assert_eq!(ids, vec![9, 2, 5]);
        assert_eq!(fox.len(), 3);
        assert_eq!(fox.occurrences(2), Some(7));
        assert_eq!(fox.occurrences(4), None);
        assert_eq!(fox.total_occurrences(), 11);
    }

    #[test]
    fn test_unknown_word_is_none() {
        let (_dir, words) = reader_for(IndexFixture::new().posting("fox", 1, 1));
        assert!(words.lookup("cat").unwrap().is_none());
        assert!(words.lookup("").unwrap().is_none());
    }

    #[test]
    fn test_collision_candidates_are_skipped() {
        let (_dir, words) = reader_for(
            IndexFixture::new()
                .buckets(1, 1)
                .posting("fo", 1, 1)
                .posting("fox", 2, 2)
                .posting("fix", 3, 3),
        );
        let fix = words.lookup("fix").unwrap().unwrap();
        assert_eq!(fix.entries(), &[PostingEntry {
            doc_id: 3,
            occurrence_count: 3
        }]);
        assert_eq!(words.lookup("fo").unwrap().unwrap().occurrences(1), Some(1));
        assert!(words.lookup("fax").unwrap().is_none());
    }

    #[test]
    fn test_extreme_posting_values() {
        let (_dir, words) = reader_for(
            IndexFixture::new()
                .posting("edge", 0, 0)
                .posting("edge", u64::MAX, u32::MAX),
        );
        let edge = words.lookup("edge").unwrap().unwrap();
        assert_eq!(edge.occurrences(0), Some(0));
        assert_eq!(edge.occurrences(u64::MAX), Some(u32::MAX));
        assert_eq!(edge.total_occurrences(), u32::MAX as u64);
    }

    #[test]
    fn test_corrupt_element_offset_is_truncation_for_every_source() {
        let mut table = TableBuilder::new(1);
        table.push(word_key("fox"), u64::MAX - 3);
        let mut bytes = Vec::new();
        table.write_at(&mut bytes);
        let file = temp_file(&bytes);

        for use_mmap in [false, true] {
            let source = open_source(file.path(), use_mmap).unwrap();
            let words = WordTableReader::new(BucketTableReader::open(source, 0).unwrap());
            let err = words.lookup("fox").unwrap_err();
            assert!(matches!(
                err,
                IndexError::Truncated { offset, len }
                    if offset == u64::MAX - 3 && len == WordRecordHeader::SIZE
            ));
            assert_eq!(err.category(), "truncated");
            assert!(err.is_corruption());
        }
    }
}
