//! Fixture writer for tests: lays out index files with the same encoders the
//! readers decode with.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::common::{DocId, FileOffset, HashKey};
use crate::hash::{doc_key, word_key};
use crate::layout::{
    BucketSlot, BucketTableHeader, ChainEntry, DocumentRecordHeader, FileHeader, MAGIC_NUMBER,
    PostingEntry, WireRecord, WordRecordHeader,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn temp_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Bucket-chained table whose element offsets are already known.
pub struct TableBuilder {
    buckets: Vec<Vec<FileOffset>>,
}

impl TableBuilder {
    pub fn new(bucket_count: u32) -> Self {
        Self {
            buckets: vec![Vec::new(); bucket_count as usize],
        }
    }

    pub fn push(&mut self, hash_key: HashKey, element_offset: FileOffset) {
        let index = (hash_key % self.buckets.len() as u64) as usize;
        self.buckets[index].push(element_offset);
    }

    /// Append header, slots and chains to `out`; returns the region offset.
    pub fn write_at(&self, out: &mut Vec<u8>) -> FileOffset {
        let base = out.len() as u64;
        BucketTableHeader {
            bucket_count: self.buckets.len() as u32,
        }
        .to_wire(out);

        let mut chain_offset = base
            + BucketTableHeader::SIZE as u64
            + (self.buckets.len() * BucketSlot::SIZE) as u64;
        for chain in &self.buckets {
            BucketSlot {
                chain_length: chain.len() as u32,
                chain_offset,
            }
            .to_wire(out);
            chain_offset += (chain.len() * ChainEntry::SIZE) as u64;
        }

        for &element_offset in self.buckets.iter().flatten() {
            ChainEntry { element_offset }.to_wire(out);
        }
        base
    }
}

/// In-memory description of one index file.
pub struct IndexFixture {
    documents: Vec<(DocId, String)>,
    words: Vec<(String, Vec<PostingEntry>)>,
    doc_buckets: u32,
    word_buckets: u32,
    magic: u32,
}

impl Default for IndexFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexFixture {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            words: Vec::new(),
            doc_buckets: 4,
            word_buckets: 4,
            magic: MAGIC_NUMBER,
        }
    }

    pub fn buckets(mut self, doc_buckets: u32, word_buckets: u32) -> Self {
        self.doc_buckets = doc_buckets;
        self.word_buckets = word_buckets;
        self
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn document(mut self, doc_id: DocId, path: &str) -> Self {
        self.documents.push((doc_id, path.to_string()));
        self
    }

    /// Append a posting; entries keep insertion order and are not deduplicated.
    pub fn posting(mut self, word: &str, doc_id: DocId, occurrence_count: u32) -> Self {
        let entry = PostingEntry {
            doc_id,
            occurrence_count,
        };
        match self.words.iter_mut().find(|(w, _)| w == word) {
            Some((_, postings)) => postings.push(entry),
            None => self.words.push((word.to_string(), vec![entry])),
        }
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; FileHeader::SIZE];

        let mut doc_table = TableBuilder::new(self.doc_buckets);
        for (doc_id, path) in &self.documents {
            doc_table.push(doc_key(*doc_id), out.len() as u64);
            DocumentRecordHeader {
                doc_id: *doc_id,
                path_len: path.len() as u16,
            }
            .to_wire(&mut out);
            out.extend_from_slice(path.as_bytes());
        }
        let doc_table_offset = doc_table.write_at(&mut out);

        let mut word_table = TableBuilder::new(self.word_buckets);
        for (word, postings) in &self.words {
            word_table.push(word_key(word), out.len() as u64);
            WordRecordHeader {
                word_len: word.len() as u16,
                posting_count: postings.len() as u32,
            }
            .to_wire(&mut out);
            out.extend_from_slice(word.as_bytes());
            for posting in postings {
                posting.to_wire(&mut out);
            }
        }
        let word_table_offset = word_table.write_at(&mut out);

        let mut header = Vec::with_capacity(FileHeader::SIZE);
        FileHeader {
            magic: self.magic,
            checksum: crc32fast::hash(&out[FileHeader::SIZE..]),
            doc_table_offset,
            word_table_offset,
        }
        .to_wire(&mut header);
        out[..FileHeader::SIZE].copy_from_slice(&header);
        out
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }
}
