//! Split planning
//!
//! Assigns a source's partitions to splits, one reader per split. With
//! offset-based dedup every split gets exactly one partition so that each
//! checkpoint mark names a single position in a single log.

use crate::dedup::{check_dedup_topology, OFFSET_DEDUP_PARTITIONS_PER_SPLIT};
use crate::error::{Error, Result};
use crate::types::{DedupMode, TopicPartition};
use serde::{Deserialize, Serialize};

/// Unit of parallel work assigned to one reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Position of this split in the plan
    pub index: usize,
    /// Partitions read by this split, in read order
    pub partitions: Vec<TopicPartition>,
}

impl Split {
    /// Create a split
    pub fn new(index: usize, partitions: Vec<TopicPartition>) -> Self {
        Self { index, partitions }
    }

    /// Create a split covering a single partition
    pub fn single(index: usize, partition: TopicPartition) -> Self {
        Self::new(index, vec![partition])
    }

    /// Number of partitions in the split
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Whether the split has no partitions
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Whether the split covers `partition`
    pub fn contains(&self, partition: &TopicPartition) -> bool {
        self.partitions.contains(partition)
    }
}

/// Plan splits for a set of partitions
///
/// Partitions are sorted by topic and partition number, then dealt round
/// robin across `min(desired_splits, partitions)` splits. Offset-based dedup
/// ignores `desired_splits` and produces one split per partition.
pub fn plan_splits(
    mut partitions: Vec<TopicPartition>,
    desired_splits: usize,
    mode: DedupMode,
) -> Result<Vec<Split>> {
    if partitions.is_empty() {
        return Err(Error::config("cannot plan splits: source has no partitions"));
    }
    if desired_splits == 0 {
        return Err(Error::invalid_value("desired_splits", "must be at least 1"));
    }

    partitions.sort();
    partitions.dedup();

    let num_splits = if mode.is_offset_based() {
        partitions.len() / OFFSET_DEDUP_PARTITIONS_PER_SPLIT
    } else {
        desired_splits.min(partitions.len())
    };

    let mut splits: Vec<Split> = (0..num_splits).map(|i| Split::new(i, Vec::new())).collect();
    for (i, partition) in partitions.into_iter().enumerate() {
        splits[i % num_splits].partitions.push(partition);
    }

    if mode.is_offset_based() {
        for split in &splits {
            check_dedup_topology(split.len())?;
        }
    }

    Ok(splits)
}
