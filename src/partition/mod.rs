//! Partition progress module
//!
//! # Overview
//!
//! A reader tracks one `PartitionMark` per assigned partition:
//! - topic and partition number identify the log
//! - `next_offset` is the first offset not yet consumed
//! - the watermark bounds the event time of unread records
//!
//! Checkpoint marks are built from these values.

mod types;

pub use types::{PartitionMark, MIN_WATERMARK};
