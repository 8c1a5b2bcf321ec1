//! Commit types
//!
//! Per-partition commit state and coordinator statistics.

use crate::error::Result;
use crate::types::{Offset, TopicPartition};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source system boundary for offset commits
///
/// Commits are advisory: the checkpoint mark is what restores a reader, so an
/// implementation may fail transiently and will simply be called again.
#[async_trait]
pub trait OffsetCommitter: Send + Sync {
    /// Record `offset` as the next offset to read for `partition`
    async fn commit(&self, partition: &TopicPartition, offset: Offset) -> Result<()>;
}

/// Where a partition stands in the commit cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    /// No offset requested yet
    Idle,
    /// Requested offset is ahead of the flushed one
    Pending,
    /// Flushed offset has caught up with the request
    Committed,
}

/// High-water marks for one partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PartitionCommit {
    requested: Option<Offset>,
    flushed: Option<Offset>,
}

impl PartitionCommit {
    /// Merge a new request; lower offsets never win
    pub(crate) fn request(&mut self, offset: Offset) {
        self.requested = Some(self.requested.map_or(offset, |current| current.max(offset)));
    }

    /// Record a successful commit of `offset`
    pub(crate) fn mark_flushed(&mut self, offset: Offset) {
        self.flushed = Some(self.flushed.map_or(offset, |current| current.max(offset)));
    }

    /// Offset waiting to be flushed, if any
    pub(crate) fn pending(&self) -> Option<Offset> {
        match (self.requested, self.flushed) {
            (Some(requested), Some(flushed)) if requested <= flushed => None,
            (requested, _) => requested,
        }
    }

    pub(crate) fn requested(&self) -> Option<Offset> {
        self.requested
    }

    pub(crate) fn flushed(&self) -> Option<Offset> {
        self.flushed
    }

    pub(crate) fn status(&self) -> CommitStatus {
        match self.requested {
            None => CommitStatus::Idle,
            Some(_) if self.pending().is_some() => CommitStatus::Pending,
            Some(_) => CommitStatus::Committed,
        }
    }
}

/// Statistics from a commit coordinator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Calls to `request_commit`
    pub requests: u64,
    /// Commits sent to the source
    pub attempts: u64,
    /// Commits the source accepted
    pub successes: u64,
    /// Commits that failed and were left for the next tick
    pub failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct CommitCounters {
    requests: AtomicU64,
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl CommitCounters {
    pub(crate) fn add_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CommitStats {
        CommitStats {
            requests: self.requests.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
