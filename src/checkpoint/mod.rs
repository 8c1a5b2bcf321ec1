//! Checkpoint module
//!
//! Handles checkpoint marks and their persisted form.
//!
//! # Overview
//!
//! The checkpoint module provides:
//! - `CheckpointMark` - Immutable snapshot of a split's partition progress
//! - `CheckpointReader` - Back-reference trait used to route finalization
//! - `CheckpointStore` - In-memory or file-backed storage of the latest mark
//!
//! A mark is created far more often than it is finalized. Finalization only
//! enqueues offsets; the reader's commit coordinator flushes them later.

mod mark;
mod store;

pub use mark::{CheckpointMark, CheckpointReader, ReaderRef};
pub use store::CheckpointStore;
