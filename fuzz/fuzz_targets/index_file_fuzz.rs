#![no_main]

use std::io::Write;

use idxquery::{IndexFileReader, QueryProcessor};
use libfuzzer_sys::fuzz_target;

// 任意字节都不能让读取路径 panic: 要么返回结果, 要么返回错误
const WORDS: [&str; 4] = ["a", "fox", "dog", "rain"];

fuzz_target!(|data: &[u8]| {
    let mut file = match tempfile::NamedTempFile::new() {
        Ok(f) => f,
        Err(_) => return,
    };
    if file.write_all(data).and_then(|_| file.flush()).is_err() {
        return;
    }

    for use_mmap in [false, true] {
        let Ok(index) = IndexFileReader::open(file.path(), false, use_mmap) else {
            continue;
        };
        if let Ok(docs) = index.new_document_table_reader() {
            for doc_id in [0u64, 1, 2, u64::MAX] {
                let _ = docs.resolve(doc_id, false);
            }
        }
        if let Ok(words) = index.new_word_table_reader() {
            for word in WORDS {
                let _ = words.lookup(word);
            }
        }
    }

    if let Ok(qp) = QueryProcessor::new(&[file.path()], false) {
        let _ = qp.process_query(&WORDS[..2]);
        let _ = qp.process_query(&WORDS[1..]);
    }
});
