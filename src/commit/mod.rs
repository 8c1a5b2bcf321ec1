//! Offset commit module
//!
//! Propagates consumed offsets back to the source system without blocking
//! the read loop.
//!
//! # Overview
//!
//! The commit module provides:
//! - `OffsetCommitter` - Trait implemented by source system clients
//! - `CommitCoordinator` - Background flush of the highest requested offsets
//! - `CommitStatus` - Per-partition state: Idle, Pending or Committed
//!
//! Commit failures are logged and retried; they never reach callers.

mod coordinator;
mod types;

pub use coordinator::CommitCoordinator;
pub use types::{CommitStats, CommitStatus, OffsetCommitter};
