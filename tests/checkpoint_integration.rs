//! Integration tests for the checkpoint protocol
//!
//! Tests the full flow: split planning → reader progress → checkpoint mark →
//! persistence → finalize → background offset commits.

use async_trait::async_trait;
use parking_lot::Mutex;
use solidafy_checkpoint::{
    encode_offset, plan_splits, CheckpointMark, CheckpointStore, CommitStatus, DedupKey,
    DedupMode, Error, Offset, OffsetCommitter, ReaderConfig, Result, Split, SplitReader,
    TopicPartition,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Source
// ============================================================================

/// In-memory stand-in for the source system's committed offsets
#[derive(Default)]
struct MemorySource {
    committed: Mutex<BTreeMap<TopicPartition, Offset>>,
    unavailable: AtomicBool,
}

impl MemorySource {
    fn committed(&self, partition: &TopicPartition) -> Option<Offset> {
        self.committed.lock().get(partition).copied()
    }

    fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl OffsetCommitter for MemorySource {
    async fn commit(&self, partition: &TopicPartition, offset: Offset) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::commit(partition.to_string(), "coordinator not available"));
        }
        self.committed.lock().insert(partition.clone(), offset);
        Ok(())
    }
}

const INTERVAL: Duration = Duration::from_millis(20);

fn tp(partition: u32) -> TopicPartition {
    TopicPartition::new("events", partition)
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + INTERVAL * 100;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(INTERVAL / 4).await;
    }
    check()
}

// ============================================================================
// End-to-end Scenarios
// ============================================================================

#[tokio::test]
async fn test_three_partitions_converge_after_finalize() {
    let source = Arc::new(MemorySource::default());
    let config = ReaderConfig::new().with_commit_interval(INTERVAL);
    let split = Split::new(0, vec![tp(0), tp(1), tp(2)]);
    let reader = SplitReader::start(split, config, source.clone()).unwrap();

    for (partition, last) in [(0, 9), (1, 3), (2, 6)] {
        for offset in 0..=last {
            reader.advance(&tp(partition), offset, None).unwrap();
        }
    }

    let mark = reader.checkpoint_mark();
    let captured: Vec<Offset> = mark.partitions().iter().map(|p| p.next_offset()).collect();
    assert_eq!(captured, vec![10, 4, 7]);

    mark.finalize();

    assert!(
        eventually(|| {
            source.committed(&tp(0)) == Some(10)
                && source.committed(&tp(1)) == Some(4)
                && source.committed(&tp(2)) == Some(7)
        })
        .await
    );

    let coordinator = reader.coordinator().unwrap();
    let flushed: Vec<Offset> = coordinator.flushed_offsets().into_values().collect();
    assert_eq!(flushed, vec![10, 4, 7]);

    reader.close().await;
}

#[tokio::test]
async fn test_dedup_split_produces_increasing_keys() {
    let source = Arc::new(MemorySource::default());
    let config = ReaderConfig::new()
        .with_dedup_mode(DedupMode::OffsetBased)
        .with_commit_interval(INTERVAL);

    let splits = plan_splits(vec![tp(0), tp(1), tp(2)], 1, DedupMode::OffsetBased).unwrap();
    let split = splits.into_iter().find(|s| s.contains(&tp(2))).unwrap();
    assert_eq!(split.len(), 1);

    let reader = SplitReader::start(split, config, source.clone()).unwrap();
    reader.seek(&tp(2), 42).unwrap();

    let first = reader.checkpoint_mark().dedup_key().unwrap();
    assert_eq!(first.as_bytes(), &encode_offset(42));

    for offset in 42..50 {
        reader.advance(&tp(2), offset, None).unwrap();
    }
    let second = reader.checkpoint_mark().dedup_key().unwrap();
    assert_eq!(second, DedupKey::from_offset(50));
    assert!(second > first);
    assert!(second.as_bytes() > first.as_bytes());

    reader.close().await;
}

#[tokio::test]
async fn test_stale_finalize_never_regresses_source() {
    let source = Arc::new(MemorySource::default());
    let config = ReaderConfig::new().with_commit_interval(INTERVAL);
    let reader = SplitReader::start(Split::single(0, tp(0)), config, source.clone()).unwrap();

    let mut marks = Vec::new();
    for offset in [4, 2, 8, 6] {
        reader.seek(&tp(0), offset + 1).unwrap();
        marks.push(reader.checkpoint_mark());
    }

    // Finalize in the order [5, 3, 9, 7].
    for mark in &marks {
        mark.finalize();
    }

    assert!(eventually(|| source.committed(&tp(0)) == Some(9)).await);

    marks[0].finalize();
    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(source.committed(&tp(0)), Some(9));
    assert_eq!(
        reader.coordinator().unwrap().status(&tp(0)),
        CommitStatus::Committed
    );

    reader.close().await;
}

#[tokio::test]
async fn test_commit_outage_does_not_block_finalize() {
    let source = Arc::new(MemorySource::default());
    source.set_unavailable(true);
    let config = ReaderConfig::new().with_commit_interval(INTERVAL);
    let reader = SplitReader::start(Split::single(0, tp(1)), config, source.clone()).unwrap();

    reader.advance(&tp(1), 30, None).unwrap();
    reader.checkpoint_mark().finalize();

    tokio::time::sleep(INTERVAL * 3).await;
    let coordinator = reader.coordinator().unwrap();
    assert_eq!(coordinator.status(&tp(1)), CommitStatus::Pending);
    assert!(coordinator.stats().failures > 0);

    source.set_unavailable(false);
    assert!(eventually(|| source.committed(&tp(1)) == Some(31)).await);

    reader.close().await;
}

// ============================================================================
// Persistence and Restart
// ============================================================================

#[tokio::test]
async fn test_restart_from_persisted_mark() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("split-0.json");
    let source = Arc::new(MemorySource::default());
    let config = ReaderConfig::new().with_commit_interval(INTERVAL);
    let split = Split::new(0, vec![tp(0), tp(1)]);

    let store = CheckpointStore::new(&path);
    {
        let reader = SplitReader::start(split.clone(), config.clone(), source.clone()).unwrap();
        reader.advance(&tp(0), 14, None).unwrap();
        reader.advance(&tp(1), 2, None).unwrap();
        let mark = reader.checkpoint_mark();
        store.save(&mark).await.unwrap();
        reader.close().await;
    }

    let restored: CheckpointMark = CheckpointStore::from_file(&path)
        .unwrap()
        .latest()
        .await
        .unwrap();
    assert!(!restored.is_bound());

    // Finalizing a rehydrated mark commits nothing.
    restored.finalize();
    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(source.committed(&tp(0)), None);

    let reader = SplitReader::resume(split, config, source.clone(), Some(&restored)).unwrap();
    let offsets: Vec<Offset> = reader.progress().iter().map(|p| p.next_offset()).collect();
    assert_eq!(offsets, vec![15, 3]);

    reader.checkpoint_mark().finalize();
    assert!(
        eventually(|| source.committed(&tp(0)) == Some(15) && source.committed(&tp(1)) == Some(3))
            .await
    );

    reader.close().await;
}

#[tokio::test]
async fn test_config_from_yaml_drives_reader() {
    let config = ReaderConfig::from_yaml_str(
        r"
dedup_mode: offset_based
commit:
  interval: 20ms
",
    )
    .unwrap();
    let source = Arc::new(MemorySource::default());

    let err = SplitReader::start(Split::new(0, vec![tp(0), tp(1)]), config.clone(), source.clone())
        .unwrap_err();
    assert!(matches!(err, Error::PartitionTopology { .. }));

    let reader = SplitReader::start(Split::single(0, tp(0)), config, source).unwrap();
    assert!(reader.checkpoint_mark().dedup_key().is_ok());
    reader.close().await;
}
