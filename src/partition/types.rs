//! Partition progress types
//!
//! A `PartitionMark` records how far a reader has consumed one partition.
//! Marks are values: advancing a partition produces a new mark.

use crate::error::{Error, Result};
use crate::types::{Offset, PartitionId, TopicPartition};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Watermark reported before any event has been observed
pub const MIN_WATERMARK: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

fn min_watermark() -> DateTime<Utc> {
    MIN_WATERMARK
}

fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

/// Consumption progress of a single partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionMark {
    topic: String,
    partition: PartitionId,
    next_offset: Offset,
    #[serde(
        rename = "watermark_millis",
        with = "chrono::serde::ts_milliseconds",
        default = "min_watermark"
    )]
    watermark: DateTime<Utc>,
}

impl PartitionMark {
    /// Create a mark with no observed watermark
    pub fn new(topic: impl Into<String>, partition: PartitionId, next_offset: Offset) -> Self {
        Self {
            topic: topic.into(),
            partition,
            next_offset,
            watermark: MIN_WATERMARK,
        }
    }

    /// Create a mark from the signed values log clients report
    ///
    /// Negative partition ids or offsets are rejected.
    pub fn try_new(
        topic: impl Into<String>,
        partition: i32,
        next_offset: i64,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let topic = topic.into();
        let partition = PartitionId::try_from(partition).map_err(|_| {
            Error::invalid_mark(&topic, format!("negative partition id {partition}"))
        })?;
        let next_offset = Offset::try_from(next_offset)
            .map_err(|_| Error::invalid_mark(&topic, format!("negative offset {next_offset}")))?;

        Ok(Self {
            topic,
            partition,
            next_offset,
            watermark: watermark.map_or(MIN_WATERMARK, truncate_to_millis),
        })
    }

    /// Return a copy carrying the given watermark
    ///
    /// Watermarks are kept at millisecond precision, the precision they are
    /// persisted with.
    #[must_use]
    pub fn with_watermark(mut self, watermark: DateTime<Utc>) -> Self {
        self.watermark = truncate_to_millis(watermark);
        self
    }

    /// Topic name
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Partition number
    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    /// Offset of the next record to read (exclusive bound of consumed records)
    pub fn next_offset(&self) -> Offset {
        self.next_offset
    }

    /// Lower bound on event time of records not yet read
    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// Whether any event time has been observed for this partition
    pub fn has_watermark(&self) -> bool {
        self.watermark != MIN_WATERMARK
    }

    /// Identity of the partition this mark describes
    pub fn topic_partition(&self) -> TopicPartition {
        TopicPartition::new(self.topic.clone(), self.partition)
    }
}

impl fmt::Display for PartitionMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PartitionMark{{topic='{}', partition={}, next_offset={}, watermark_millis={}}}",
            self.topic,
            self.partition,
            self.next_offset,
            self.watermark.timestamp_millis()
        )
    }
}
