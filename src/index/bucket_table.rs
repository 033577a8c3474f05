use crate::common::{FileOffset, HashKey, IndexError, Result};
use crate::layout::{BucketSlot, BucketTableHeader, ChainEntry, WireRecord};
use crate::storage::{IndexSource, check_extent, read_record};

/// Reader over one on-disk bucket-chained hash table region.
///
/// The region is a [`BucketTableHeader`] followed by `bucket_count`
/// [`BucketSlot`]s. Each slot points at a contiguous run of [`ChainEntry`]
/// records holding the file offsets of the elements hashed into that bucket.
/// Only the header is cached; every lookup goes back to the source.
pub struct BucketTableReader {
    source: Box<dyn IndexSource>,
    base_offset: FileOffset,
    header: BucketTableHeader,
}

impl BucketTableReader {
    /// Open the region starting at `base_offset`.
    pub fn open(source: Box<dyn IndexSource>, base_offset: FileOffset) -> Result<Self> {
        let header: BucketTableHeader = read_record(source.as_ref(), base_offset)?;
        if header.bucket_count == 0 {
            return Err(IndexError::corruption(format!(
                "{}: hash table at offset {base_offset} has zero buckets",
                source.path().display()
            )));
        }

        let slots_len = header.bucket_count as u64 * BucketSlot::SIZE as u64;
        check_extent(
            source.as_ref(),
            base_offset + BucketTableHeader::SIZE as u64,
            slots_len,
        )?;

        Ok(Self {
            source,
            base_offset,
            header,
        })
    }

    #[inline]
    pub fn bucket_count(&self) -> u32 {
        self.header.bucket_count
    }

    #[inline]
    pub fn base_offset(&self) -> FileOffset {
        self.base_offset
    }

    /// The source this table reads from. Element records live in the same
    /// file, so readers layered on top decode them through it.
    pub(crate) fn source(&self) -> &dyn IndexSource {
        self.source.as_ref()
    }

    #[inline]
    fn slot_offset(&self, bucket_index: u64) -> FileOffset {
        self.base_offset + BucketTableHeader::SIZE as u64 + bucket_index * BucketSlot::SIZE as u64
    }

    /// Offsets of every element in the bucket `hash_key` maps to, in on-disk
    /// order. An empty bucket yields an empty vector.
    pub fn lookup(&self, hash_key: HashKey) -> Result<Vec<FileOffset>> {
        let bucket_index = hash_key % self.header.bucket_count as u64;
        let slot: BucketSlot = read_record(self.source(), self.slot_offset(bucket_index))?;

        log::trace!(
            "bucket {bucket_index} of table @{}: {} element(s) at {}",
            self.base_offset,
            slot.chain_length,
            slot.chain_offset
        );

        if slot.chain_length == 0 {
            return Ok(Vec::new());
        }

        let chain_len = slot.chain_length as u64 * ChainEntry::SIZE as u64;
        check_extent(self.source(), slot.chain_offset, chain_len).map_err(|_| {
            IndexError::corruption(format!(
                "{}: bucket {bucket_index} chain of {} entries at offset {} overruns the file",
                self.source.path().display(),
                slot.chain_length,
                slot.chain_offset
            ))
        })?;

        let mut offsets = Vec::with_capacity(slot.chain_length as usize);
        let mut entry_offset = slot.chain_offset;
        for _ in 0..slot.chain_length {
            let entry: ChainEntry = read_record(self.source(), entry_offset)?;
            offsets.push(entry.element_offset);
            entry_offset += ChainEntry::SIZE as u64;
        }

        Ok(offsets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::open_source;
    use crate::test_util::{TableBuilder, temp_file};

    /// Table with three buckets; bucket 0 holds two elements, bucket 1 is
    /// empty and bucket 2 holds one.
    fn sample_table(base: u64) -> Vec<u8> {
        let mut table = TableBuilder::new(3);
        table.push(0, 1000);
        table.push(3, 2000);
        table.push(5, 3000);
        let mut bytes = vec![0u8; base as usize];
        table.write_at(&mut bytes);
        bytes
    }

    fn open_table(bytes: &[u8], base: u64, use_mmap: bool) -> BucketTableReader {
        let file = temp_file(bytes);
        let source = open_source(file.path(), use_mmap).unwrap();
        BucketTableReader::open(source, base).unwrap()
    }

    #[test]
    fn test_lookup_preserves_chain_order() {
        for use_mmap in [false, true] {
            let table = open_table(&sample_table(16), 16, use_mmap);
            assert_eq!(table.bucket_count(), 3);
            assert_eq!(table.base_offset(), 16);

            assert_eq!(table.lookup(0).unwrap(), vec![1000, 2000]);
            assert_eq!(table.lookup(3).unwrap(), vec![1000, 2000]);
            assert_eq!(table.lookup(2).unwrap(), vec![3000]);
            assert_eq!(table.lookup(u64::MAX).unwrap(), vec![1000, 2000]);
        }
    }

    #[test]
    fn test_empty_bucket_is_not_an_error() {
        let table = open_table(&sample_table(0), 0, false);
        assert!(table.lookup(1).unwrap().is_empty());
        assert!(table.lookup(4).unwrap().is_empty());
    }

    #[test]
    fn test_lookup_is_repeatable() {
        let table = open_table(&sample_table(8), 8, false);
        let first = table.lookup(0).unwrap();
        for _ in 0..10 {
            assert_eq!(table.lookup(0).unwrap(), first);
            assert!(table.lookup(1).unwrap().is_empty());
        }
    }

    #[test]
    fn test_zero_buckets_rejected() {
        let file = temp_file(&[0, 0, 0, 0]);
        let source = open_source(file.path(), false).unwrap();
        let err = BucketTableReader::open(source, 0).err().unwrap();
        assert!(matches!(err, IndexError::Corruption { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let file = temp_file(&[0, 0]);
        let source = open_source(file.path(), false).unwrap();
        let err = BucketTableReader::open(source, 0).err().unwrap();
        assert!(matches!(err, IndexError::Truncated { .. }));
    }

    #[test]
    fn test_slots_past_end_rejected() {
        // Claims 100 buckets but stores none.
        let file = temp_file(&[0, 0, 0, 100]);
        let source = open_source(file.path(), false).unwrap();
        let err = BucketTableReader::open(source, 0).err().unwrap();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_chain_overrun_is_error_not_miss() {
        let mut bytes = Vec::new();
        BucketTableHeader { bucket_count: 1 }.to_wire(&mut bytes);
        BucketSlot {
            chain_length: 4,
            chain_offset: 16,
        }
        .to_wire(&mut bytes);
        let file = temp_file(&bytes);
        for use_mmap in [false, true] {
            let source = open_source(file.path(), use_mmap).unwrap();
            let table = BucketTableReader::open(source, 0).unwrap();
            let err = table.lookup(7).unwrap_err();
            assert!(err.is_corruption());
            let path = file.path().display().to_string();
            assert!(err.to_string().contains(&path), "{err}");
        }
    }
}
