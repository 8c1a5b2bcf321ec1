//! Commit coordinator implementation
//!
//! Finalization only records "this offset may be committed"; a background task
//! owned by the coordinator periodically pushes the highest requested offset
//! of each partition to the source system.

use super::types::{CommitCounters, CommitStats, CommitStatus, OffsetCommitter, PartitionCommit};
use crate::config::CommitConfig;
use crate::error::{Error, Result};
use crate::types::{Offset, TopicPartition};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// State shared between the coordinator handle and its flush task
struct Shared {
    committer: Arc<dyn OffsetCommitter>,
    partitions: DashMap<TopicPartition, PartitionCommit>,
    counters: CommitCounters,
    /// Upper bound on a single `commit` call
    commit_timeout: Duration,
    /// Serializes flush passes (ticks, manual flushes, the final drain)
    flush_lock: Mutex<()>,
}

impl Shared {
    async fn flush(&self) {
        let _guard = self.flush_lock.lock().await;

        let mut pending: Vec<(TopicPartition, Offset)> = self
            .partitions
            .iter()
            .filter_map(|entry| entry.value().pending().map(|offset| (entry.key().clone(), offset)))
            .collect();
        pending.sort();

        for (partition, offset) in pending {
            self.counters.add_attempt();
            let outcome =
                tokio::time::timeout(self.commit_timeout, self.committer.commit(&partition, offset))
                    .await;
            match outcome {
                Ok(Ok(())) => {
                    self.counters.add_success();
                    if let Some(mut state) = self.partitions.get_mut(&partition) {
                        state.mark_flushed(offset);
                    }
                    debug!(partition = %partition, offset, "committed offset");
                }
                Ok(Err(e)) => {
                    self.counters.add_failure();
                    warn!(
                        partition = %partition,
                        offset,
                        error = %e,
                        "offset commit failed, retrying on next tick"
                    );
                }
                Err(_) => {
                    self.counters.add_failure();
                    warn!(
                        partition = %partition,
                        offset,
                        timeout_ms = self.commit_timeout.as_millis() as u64,
                        "offset commit timed out, retrying on next tick"
                    );
                }
            }
        }
    }
}

/// Per-reader coordinator for asynchronous offset commits
///
/// `request_commit` never waits on the source; the flush task runs every
/// `CommitConfig::interval`, and each commit call is cut off after
/// `CommitConfig::commit_timeout`. Dropping the coordinator stops the task
/// after a last flush attempt, `shutdown` does the same and waits for it.
pub struct CommitCoordinator {
    shared: Arc<Shared>,
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl CommitCoordinator {
    /// Start a coordinator on the current tokio runtime
    pub fn start(committer: Arc<dyn OffsetCommitter>, config: &CommitConfig) -> Result<Self> {
        config.validate()?;
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::config(format!("commit coordinator needs a tokio runtime: {e}")))?;

        let shared = Arc::new(Shared {
            committer,
            partitions: DashMap::new(),
            counters: CommitCounters::default(),
            commit_timeout: config.commit_timeout,
            flush_lock: Mutex::new(()),
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = handle.spawn(run(Arc::clone(&shared), config.interval, shutdown_rx));

        info!(
            interval_ms = config.interval.as_millis() as u64,
            commit_timeout_ms = config.commit_timeout.as_millis() as u64,
            "commit coordinator started"
        );

        Ok(Self {
            shared,
            interval: config.interval,
            shutdown_tx,
            task: parking_lot::Mutex::new(Some(task)),
        })
    }

    /// Ask for `offset` to be committed for `partition`
    ///
    /// Keeps the maximum of all requested offsets, so stale or repeated
    /// requests are harmless.
    pub fn request_commit(&self, partition: &TopicPartition, offset: Offset) {
        self.shared.counters.add_request();
        self.shared
            .partitions
            .entry(partition.clone())
            .or_default()
            .request(offset);
    }

    /// Run one flush pass now
    pub async fn flush(&self) {
        self.shared.flush().await;
    }

    /// Stop the flush task after a final best-effort flush
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "commit coordinator task ended abnormally");
            }
        }
    }

    /// Whether the flush task is still running
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Commit state of a partition
    pub fn status(&self, partition: &TopicPartition) -> CommitStatus {
        self.shared
            .partitions
            .get(partition)
            .map_or(CommitStatus::Idle, |state| state.status())
    }

    /// Highest offset requested so far
    pub fn requested_offset(&self, partition: &TopicPartition) -> Option<Offset> {
        self.shared
            .partitions
            .get(partition)
            .and_then(|state| state.requested())
    }

    /// Highest offset the source accepted
    pub fn flushed_offset(&self, partition: &TopicPartition) -> Option<Offset> {
        self.shared
            .partitions
            .get(partition)
            .and_then(|state| state.flushed())
    }

    /// Flushed offsets of every partition that has one
    pub fn flushed_offsets(&self) -> BTreeMap<TopicPartition, Offset> {
        self.shared
            .partitions
            .iter()
            .filter_map(|entry| entry.value().flushed().map(|offset| (entry.key().clone(), offset)))
            .collect()
    }

    /// Flush interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Get statistics
    pub fn stats(&self) -> CommitStats {
        self.shared.counters.snapshot()
    }
}

impl std::fmt::Debug for CommitCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitCoordinator")
            .field("interval", &self.interval)
            .field("partitions", &self.shared.partitions.len())
            .finish_non_exhaustive()
    }
}

async fn run(shared: Arc<Shared>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    // First flush one interval after start, not immediately.
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => shared.flush().await,
            changed = shutdown.changed() => {
                // A dropped sender means the coordinator itself was dropped.
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    shared.flush().await;
    info!(stats = ?shared.counters.snapshot(), "commit coordinator stopped");
}
