//! Hash keys shared with the index builder.
//!
//! Bucket placement in an index file depends on these functions, so they
//! must stay bit-for-bit identical to the ones the files were built with.

use crate::common::{DocId, HashKey};

/// 64-bit FNV-1a.
pub struct FnvHash;

impl FnvHash {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    /// Computes a hash for a byte slice.
    pub fn compute_bytes(data: &[u8]) -> u64 {
        let mut hash_state = Self::OFFSET_BASIS;
        for &byte in data {
            hash_state ^= byte as u64;
            hash_state = hash_state.wrapping_mul(Self::PRIME);
        }
        hash_state
    }
}

/// Key of a normalized word in the word table.
#[inline]
pub fn word_key(word: &str) -> HashKey {
    FnvHash::compute_bytes(word.as_bytes())
}

/// Key of a document in the document table. Document ids are their own key.
#[inline]
pub fn doc_key(doc_id: DocId) -> HashKey {
    doc_id
}
