//! Split reader implementation
//!
//! Tracks per-partition progress for one split and produces checkpoint marks.
//! Polling the log is left to the caller, which reports every record position
//! through [`SplitReader::advance`].

use crate::checkpoint::{CheckpointMark, CheckpointReader, ReaderRef};
use crate::commit::{CommitCoordinator, OffsetCommitter};
use crate::config::ReaderConfig;
use crate::dedup::check_dedup_topology;
use crate::error::{Error, Result};
use crate::partition::PartitionMark;
use crate::split::Split;
use crate::types::{Offset, TopicPartition};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Reader for a single split
///
/// Always handled through an `Arc` so that checkpoint marks can hold a weak
/// reference back to it.
pub struct SplitReader {
    split: Split,
    config: ReaderConfig,
    /// Progress in split order
    progress: Mutex<Vec<PartitionMark>>,
    /// Present only when offsets are committed on finalize
    coordinator: Option<CommitCoordinator>,
    self_ref: Weak<SplitReader>,
}

impl SplitReader {
    /// Start reading a split from offset zero on every partition
    pub fn start(
        split: Split,
        config: ReaderConfig,
        committer: Arc<dyn OffsetCommitter>,
    ) -> Result<Arc<Self>> {
        Self::resume(split, config, committer, None)
    }

    /// Start reading a split, restoring progress from a previous mark
    ///
    /// The mark must list exactly the split's partitions in split order.
    pub fn resume(
        split: Split,
        config: ReaderConfig,
        committer: Arc<dyn OffsetCommitter>,
        mark: Option<&CheckpointMark>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        if split.is_empty() {
            return Err(Error::config(format!("split {} has no partitions", split.index)));
        }
        if config.dedup_mode.is_offset_based() {
            check_dedup_topology(split.len())?;
        }

        let progress = match mark {
            Some(mark) => restore_progress(&split, mark)?,
            None => split
                .partitions
                .iter()
                .map(|tp| PartitionMark::new(tp.topic.clone(), tp.partition, 0))
                .collect(),
        };

        let coordinator = if config.commit_offsets_in_finalize {
            Some(CommitCoordinator::start(committer, &config.commit)?)
        } else {
            None
        };

        info!(
            split = split.index,
            partitions = split.len(),
            dedup_mode = ?config.dedup_mode,
            resumed = mark.is_some(),
            "split reader started"
        );

        Ok(Arc::new_cyclic(|self_ref| Self {
            split,
            config,
            progress: Mutex::new(progress),
            coordinator,
            self_ref: self_ref.clone(),
        }))
    }

    /// Record that the record at `record_offset` was read
    ///
    /// Moves the partition's next offset to `record_offset + 1` and raises its
    /// watermark to `event_time` when later. Positions behind the current one
    /// are ignored.
    pub fn advance(
        &self,
        partition: &TopicPartition,
        record_offset: Offset,
        event_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let next_offset = record_offset.checked_add(1).ok_or_else(|| {
            Error::partition(partition.to_string(), "record offset overflows u64")
        })?;

        let mut progress = self.progress.lock();
        let slot = find_slot(&mut progress, partition)?;

        if next_offset <= slot.next_offset() {
            debug!(
                partition = %partition,
                record_offset,
                next_offset = slot.next_offset(),
                "ignoring record behind current position"
            );
            return Ok(());
        }

        let watermark = match event_time {
            Some(ts) if ts > slot.watermark() => ts,
            _ => slot.watermark(),
        };
        *slot = PartitionMark::new(partition.topic.clone(), partition.partition, next_offset)
            .with_watermark(watermark);
        Ok(())
    }

    /// Position a partition explicitly, e.g. after the client resolved its start offset
    pub fn seek(&self, partition: &TopicPartition, next_offset: Offset) -> Result<()> {
        let mut progress = self.progress.lock();
        let slot = find_slot(&mut progress, partition)?;
        *slot = PartitionMark::new(partition.topic.clone(), partition.partition, next_offset)
            .with_watermark(slot.watermark());
        Ok(())
    }

    /// Current progress of every partition, in split order
    pub fn progress(&self) -> Vec<PartitionMark> {
        self.progress.lock().clone()
    }

    /// Freeze current progress into a checkpoint mark
    pub fn checkpoint_mark(&self) -> CheckpointMark {
        let partitions = self.progress.lock().clone();
        let reader = if self.config.binds_reader() {
            Some(self.self_ref.clone() as ReaderRef)
        } else {
            None
        };
        CheckpointMark::new(partitions, reader)
    }

    /// Split this reader covers
    pub fn split(&self) -> &Split {
        &self.split
    }

    /// Reader configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Commit coordinator, when offsets are committed on finalize
    pub fn coordinator(&self) -> Option<&CommitCoordinator> {
        self.coordinator.as_ref()
    }

    /// Stop the reader, making a last attempt to commit pending offsets
    pub async fn close(&self) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.shutdown().await;
        }
        info!(split = self.split.index, "split reader closed");
    }
}

impl CheckpointReader for SplitReader {
    fn finalize_checkpoint_async(&self, mark: &CheckpointMark) {
        let Some(coordinator) = &self.coordinator else {
            debug!(split = self.split.index, "offset commits disabled, finalize is a no-op");
            return;
        };

        for partition in mark.partitions() {
            let tp = partition.topic_partition();
            if self.split.contains(&tp) {
                coordinator.request_commit(&tp, partition.next_offset());
            } else {
                warn!(
                    split = self.split.index,
                    partition = %tp,
                    "finalized mark names a partition outside this split"
                );
            }
        }
    }

    fn offset_dedup_enabled(&self) -> bool {
        self.config.dedup_mode.is_offset_based()
    }
}

impl std::fmt::Debug for SplitReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitReader")
            .field("split", &self.split)
            .field("config", &self.config)
            .field("progress", &*self.progress.lock())
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

fn find_slot<'a>(
    progress: &'a mut [PartitionMark],
    partition: &TopicPartition,
) -> Result<&'a mut PartitionMark> {
    progress
        .iter_mut()
        .find(|mark| mark.topic() == partition.topic && mark.partition() == partition.partition)
        .ok_or_else(|| Error::partition(partition.to_string(), "partition is not assigned to this split"))
}

fn restore_progress(split: &Split, mark: &CheckpointMark) -> Result<Vec<PartitionMark>> {
    let restored: Vec<TopicPartition> = mark
        .partitions()
        .iter()
        .map(PartitionMark::topic_partition)
        .collect();
    if restored != split.partitions {
        return Err(Error::checkpoint(format!(
            "checkpoint mark partitions {restored:?} do not match split {} partitions {:?}",
            split.index, split.partitions
        )));
    }
    Ok(mark.partitions().to_vec())
}
