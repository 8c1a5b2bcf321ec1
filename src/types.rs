//! Common types used throughout Solidafy Checkpoint
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Position in a partition's log. Always the offset of the next record to read.
pub type Offset = u64;

/// Partition number within a topic
pub type PartitionId = u32;

// ============================================================================
// Partition Identity
// ============================================================================

/// Identity of a single ordered log: topic name plus partition number
///
/// Ordered by topic, then partition, which is the order split planning
/// assigns partitions in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicPartition {
    /// Topic (or stream) name
    pub topic: String,
    /// Partition number
    pub partition: PartitionId,
}

impl TopicPartition {
    /// Create a new topic partition
    pub fn new(topic: impl Into<String>, partition: PartitionId) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

// ============================================================================
// Dedup Mode
// ============================================================================

/// How a downstream sink deduplicates replayed deliveries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// No offset-derived dedup keys
    #[default]
    None,
    /// Dedup keys are the encoded next offset of the split's single partition
    OffsetBased,
}

impl DedupMode {
    /// Whether offset-based dedup keys are requested
    pub fn is_offset_based(self) -> bool {
        matches!(self, Self::OffsetBased)
    }
}
