//! Multi-index AND query processing
//!
//! A [`QueryProcessor`] holds one document-table and word-table reader pair
//! per index file. Each query is answered file by file: the postings of every
//! query word are intersected by document id, ranks are summed, and the
//! survivors are resolved to names. Rows from different files are never
//! merged, even when they name the same document.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::common::{DocId, IndexError, QueryConfig, Result};
use crate::index::{DocumentTableReader, WordTableReader};
use crate::index_file::IndexFileReader;

/// One output row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryResult {
    pub document_name: String,
    /// Sum of the occurrence counts of every query word in this document,
    /// within a single index file
    pub rank: u64,
}

impl QueryResult {
    pub fn new(document_name: impl Into<String>, rank: u64) -> Self {
        Self {
            document_name: document_name.into(),
            rank,
        }
    }
}

/// Output order: rank descending, then document name ascending.
impl Ord for QueryResult {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .rank
            .cmp(&self.rank)
            .then_with(|| self.document_name.cmp(&other.document_name))
    }
}

impl PartialOrd for QueryResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Readers bound to one index file
struct IndexHandle {
    path: PathBuf,
    docs: DocumentTableReader,
    words: WordTableReader,
}

/// Answers AND queries over a fixed set of index files
pub struct QueryProcessor {
    indexes: Vec<IndexHandle>,
    validate: bool,
}

impl QueryProcessor {
    /// Open every file in `index_paths`. Any failure aborts construction.
    pub fn new<P: AsRef<Path>>(index_paths: &[P], validate: bool) -> Result<Self> {
        let config = QueryConfig {
            index_paths: index_paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            validate,
            ..QueryConfig::default()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: QueryConfig) -> Result<Self> {
        config.validate()?;

        let mut indexes = Vec::with_capacity(config.index_paths.len());
        for path in &config.index_paths {
            let index = IndexFileReader::open(path, config.validate, config.use_mmap)?;
            indexes.push(IndexHandle {
                path: path.clone(),
                docs: index.new_document_table_reader()?,
                words: index.new_word_table_reader()?,
            });
        }

        log::info!(
            "Query processor ready over {} index file(s), validate={}",
            indexes.len(),
            config.validate
        );

        Ok(Self {
            indexes,
            validate: config.validate,
        })
    }

    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    pub fn index_paths(&self) -> impl Iterator<Item = &Path> {
        self.indexes.iter().map(|i| i.path.as_path())
    }

    /// Documents containing every word of `words`, ranked.
    ///
    /// Words must already be normalized. A word absent from a file simply
    /// leaves that file without results.
    pub fn process_query<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<QueryResult>> {
        if words.is_empty() {
            return Err(IndexError::EmptyQuery);
        }

        let mut results = Vec::new();
        for index in &self.indexes {
            let matches = intersect(&index.words, words)?;
            log::debug!(
                "{}: {} document(s) match {} word(s)",
                index.path.display(),
                matches.len(),
                words.len()
            );

            for (doc_id, rank) in matches {
                let document_name = index.docs.resolve(doc_id, self.validate)?;
                results.push(QueryResult {
                    document_name,
                    rank,
                });
            }
        }

        // Stable: equal rows keep file order, then in-file order
        results.sort();
        Ok(results)
    }
}

/// Documents of one file containing every word, with summed ranks, in the
/// disk order of the first word's postings.
fn intersect<S: AsRef<str>>(
    reader: &WordTableReader,
    words: &[S],
) -> Result<Vec<(DocId, u64)>> {
    let Some((first, rest)) = words.split_first() else {
        return Ok(Vec::new());
    };
    let Some(postings) = reader.lookup(first.as_ref())? else {
        return Ok(Vec::new());
    };

    let mut seen: HashSet<DocId, RandomState> =
        HashSet::with_capacity_and_hasher(postings.len(), RandomState::new());
    let mut candidates: Vec<(DocId, u64)> = postings
        .into_entries()
        .into_iter()
        .filter(|e| seen.insert(e.doc_id))
        .map(|e| (e.doc_id, e.occurrence_count as u64))
        .collect();

    for word in rest {
        if candidates.is_empty() {
            break;
        }
        let Some(postings) = reader.lookup(word.as_ref())? else {
            return Ok(Vec::new());
        };

        let mut counts: HashMap<DocId, u32, RandomState> =
            HashMap::with_capacity_and_hasher(postings.len(), RandomState::new());
        for entry in postings.entries() {
            // First entry wins for duplicated ids
            counts.entry(entry.doc_id).or_insert(entry.occurrence_count);
        }

        candidates.retain_mut(|(doc_id, rank)| match counts.get(doc_id) {
            Some(&count) => {
                *rank += count as u64;
                true
            }
            None => false,
        });
    }

    Ok(candidates)
}
