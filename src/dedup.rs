//! Offset-based deduplication keys
//!
//! A dedup key names a position in exactly one ordered log, so it can only be
//! derived from a mark that covers a single partition. Split planning
//! guarantees one partition per split whenever offset dedup is enabled; the
//! checks here re-assert that at every checkpoint boundary.

use crate::checkpoint::CheckpointMark;
use crate::codec::DedupKey;
use crate::error::{Error, Result};

/// Partitions a split may carry when offset-based dedup is enabled
pub const OFFSET_DEDUP_PARTITIONS_PER_SPLIT: usize = 1;

/// Fail unless a split carries exactly one partition
pub fn check_dedup_topology(partitions_per_split: usize) -> Result<()> {
    if partitions_per_split == OFFSET_DEDUP_PARTITIONS_PER_SPLIT {
        Ok(())
    } else {
        Err(Error::topology(
            OFFSET_DEDUP_PARTITIONS_PER_SPLIT,
            partitions_per_split,
        ))
    }
}

/// Derive the dedup key for a checkpoint mark
///
/// The mark must be bound to a live reader built for offset-based dedup and
/// must carry exactly one partition. The key is the encoded next offset of
/// that partition.
pub fn offset_dedup_key(mark: &CheckpointMark) -> Result<DedupKey> {
    let reader = mark.reader().ok_or_else(|| {
        Error::config("checkpoint mark is not bound to a live reader; cannot derive dedup key")
    })?;
    if !reader.offset_dedup_enabled() {
        return Err(Error::config(
            "dedup key requested but the reader is not configured for offset-based deduplication",
        ));
    }

    check_dedup_topology(mark.partitions().len())?;
    let partition = &mark.partitions()[0];
    Ok(DedupKey::from_offset(partition.next_offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{CheckpointReader, ReaderRef};
    use crate::codec::encode_offset;
    use crate::partition::PartitionMark;
    use proptest::prelude::*;
    use std::sync::Arc;

    struct StubReader {
        dedup: bool,
    }

    impl CheckpointReader for StubReader {
        fn finalize_checkpoint_async(&self, _mark: &CheckpointMark) {}

        fn offset_dedup_enabled(&self) -> bool {
            self.dedup
        }
    }

    fn reader(dedup: bool) -> Arc<StubReader> {
        Arc::new(StubReader { dedup })
    }

    fn bound_mark(reader: &Arc<StubReader>, offsets: &[u64]) -> CheckpointMark {
        let weak: ReaderRef = Arc::downgrade(reader) as ReaderRef;
        let partitions = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| PartitionMark::new("events", i as u32, *offset))
            .collect();
        CheckpointMark::new(partitions, Some(weak))
    }

    #[test]
    fn test_single_partition_key() {
        let reader = reader(true);
        let mark = bound_mark(&reader, &[42]);
        let key = offset_dedup_key(&mark).unwrap();
        assert_eq!(key.as_bytes(), &encode_offset(42));
        assert_eq!(mark.dedup_key().unwrap(), key);
    }

    #[test]
    fn test_empty_mark_violates_topology() {
        let reader = reader(true);
        let mark = bound_mark(&reader, &[]);
        let err = offset_dedup_key(&mark).unwrap_err();
        assert!(matches!(
            err,
            Error::PartitionTopology {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_multi_partition_mark_violates_topology() {
        let reader = reader(true);
        let mark = bound_mark(&reader, &[1, 2, 3]);
        let err = offset_dedup_key(&mark).unwrap_err();
        assert!(matches!(
            err,
            Error::PartitionTopology {
                expected: 1,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_reader_without_dedup_is_config_error() {
        let reader = reader(false);
        let mark = bound_mark(&reader, &[42]);
        assert!(matches!(
            offset_dedup_key(&mark),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_unbound_mark_is_config_error() {
        let mark = CheckpointMark::detached(vec![PartitionMark::new("events", 0, 1)]);
        assert!(matches!(
            offset_dedup_key(&mark),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_dropped_reader_is_config_error() {
        let reader = reader(true);
        let mark = bound_mark(&reader, &[1]);
        drop(reader);
        assert!(matches!(
            offset_dedup_key(&mark),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_check_dedup_topology() {
        assert!(check_dedup_topology(1).is_ok());
        assert!(check_dedup_topology(0).is_err());
        assert!(check_dedup_topology(2).is_err());
    }

    proptest! {
        #[test]
        fn key_is_encoded_next_offset(offset in any::<u64>()) {
            let reader = reader(true);
            let mark = bound_mark(&reader, &[offset]);
            let key = offset_dedup_key(&mark).unwrap();
            prop_assert_eq!(key.as_bytes(), &encode_offset(offset)[..]);
        }

        #[test]
        fn keys_order_like_offsets(a in any::<u64>(), b in any::<u64>()) {
            let reader = reader(true);
            let ka = offset_dedup_key(&bound_mark(&reader, &[a])).unwrap();
            let kb = offset_dedup_key(&bound_mark(&reader, &[b])).unwrap();
            prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));
        }

        #[test]
        fn non_singleton_marks_always_fail(offsets in prop::collection::vec(any::<u64>(), 2..6)) {
            let reader = reader(true);
            let mark = bound_mark(&reader, &offsets);
            let is_topology_error = matches!(
                offset_dedup_key(&mark),
                Err(Error::PartitionTopology { .. })
            );
            prop_assert!(is_topology_error);
        }
    }
}
