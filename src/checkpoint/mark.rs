//! Checkpoint mark
//!
//! Point-in-time copy of a reader's partition progress. The engine persists
//! the mark with pipeline state and calls [`CheckpointMark::finalize`] once
//! everything that depends on it is durable.

use crate::codec::DedupKey;
use crate::dedup;
use crate::error::Result;
use crate::partition::PartitionMark;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// The reader side of the checkpoint protocol
///
/// A mark keeps a weak back-reference to the reader that produced it so that
/// finalization can be routed to the reader's commit coordinator.
pub trait CheckpointReader: Send + Sync {
    /// Enqueue the mark's offsets for commit. Must not block.
    fn finalize_checkpoint_async(&self, mark: &CheckpointMark);

    /// Whether the reader was built for offset-based deduplication
    fn offset_dedup_enabled(&self) -> bool;
}

/// Non-owning handle from a mark to its reader
pub type ReaderRef = Weak<dyn CheckpointReader>;

/// Immutable snapshot of consumption progress for a split
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CheckpointMark {
    partitions: Vec<PartitionMark>,
    /// Present only when the reader wants finalize callbacks. Never persisted.
    #[serde(skip)]
    reader: Option<ReaderRef>,
}

impl CheckpointMark {
    /// Create a mark from partition progress in reader order
    pub fn new(partitions: Vec<PartitionMark>, reader: Option<ReaderRef>) -> Self {
        Self { partitions, reader }
    }

    /// Create a mark that is not bound to any reader
    pub fn detached(partitions: Vec<PartitionMark>) -> Self {
        Self::new(partitions, None)
    }

    /// Copy of this mark bound to a live reader
    ///
    /// Used after rehydrating a persisted mark when live finalize behaviour
    /// is needed again.
    #[must_use]
    pub fn rebind(&self, reader: ReaderRef) -> Self {
        Self {
            partitions: self.partitions.clone(),
            reader: Some(reader),
        }
    }

    /// Partition progress captured by this mark
    pub fn partitions(&self) -> &[PartitionMark] {
        &self.partitions
    }

    /// Whether a reader reference is attached (it may since have been dropped)
    pub fn is_bound(&self) -> bool {
        self.reader.is_some()
    }

    /// Upgrade the reader reference, if present and still alive
    pub fn reader(&self) -> Option<Arc<dyn CheckpointReader>> {
        self.reader.as_ref().and_then(Weak::upgrade)
    }

    /// Signal that this mark's offsets are safe to commit
    ///
    /// Hands the offsets to the owning reader's commit coordinator and returns
    /// immediately. Without a live reader this does nothing: the offsets stay
    /// recoverable from the mark itself.
    pub fn finalize(&self) {
        match &self.reader {
            None => debug!(mark = %self, "finalize on unbound checkpoint mark, skipping commit"),
            Some(weak) => match weak.upgrade() {
                Some(reader) => reader.finalize_checkpoint_async(self),
                None => debug!(mark = %self, "reader dropped before finalize, skipping commit"),
            },
        }
    }

    /// Dedup key for an offset-based dedup sink
    pub fn dedup_key(&self) -> Result<DedupKey> {
        dedup::offset_dedup_key(self)
    }

    /// Serialize the persisted form (partitions only)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a mark from its persisted form. The result is unbound.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl PartialEq for CheckpointMark {
    /// Marks compare by captured progress; the reader binding is not part of
    /// a mark's value.
    fn eq(&self, other: &Self) -> bool {
        self.partitions == other.partitions
    }
}

impl Eq for CheckpointMark {}

impl fmt::Display for CheckpointMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CheckpointMark{{partitions=")?;
        for (i, partition) in self.partitions.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{partition}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for CheckpointMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckpointMark")
            .field("partitions", &self.partitions)
            .field("bound", &self.is_bound())
            .finish()
    }
}
