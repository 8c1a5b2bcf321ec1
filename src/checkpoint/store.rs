//! Checkpoint store implementation
//!
//! Keeps the latest checkpoint mark, optionally persisted to a JSON file with
//! atomic writes. Only the partition progress is written; marks loaded back
//! are never bound to a reader.

use super::mark::CheckpointMark;
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Store for persisting and loading checkpoint marks
#[derive(Debug)]
pub struct CheckpointStore {
    /// Path to the checkpoint file
    path: PathBuf,
    /// Latest mark (cached)
    latest: Arc<RwLock<Option<CheckpointMark>>>,
}

impl CheckpointStore {
    /// Create a new store writing to the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Create an in-memory store (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a store from a file, loading an existing mark if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let latest = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Some(CheckpointMark::from_json(&contents)?)
        } else {
            None
        };

        Ok(Self {
            path,
            latest: Arc::new(RwLock::new(latest)),
        })
    }

    /// Record a new mark, replacing the previous one
    ///
    /// The cache lock is held until the file is in place, so concurrent saves
    /// through clones of the store are applied one at a time.
    pub async fn save(&self, mark: &CheckpointMark) -> Result<()> {
        let mark = CheckpointMark::detached(mark.partitions().to_vec());
        let mut latest = self.latest.write().await;

        if !self.is_in_memory() {
            self.persist(&mark).await?;
        }
        *latest = Some(mark);

        Ok(())
    }

    /// Load the mark from file, refreshing the cache
    pub async fn load(&self) -> Result<Option<CheckpointMark>> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(self.latest().await);
        }

        let mut latest = self.latest.write().await;
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let loaded = CheckpointMark::from_json(&contents)?;
        *latest = Some(loaded.clone());

        Ok(Some(loaded))
    }

    /// Latest cached mark
    pub async fn latest(&self) -> Option<CheckpointMark> {
        self.latest.read().await.clone()
    }

    /// Forget the stored mark
    pub async fn clear(&self) -> Result<()> {
        let mut latest = self.latest.write().await;
        *latest = None;

        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        tokio::fs::remove_file(&self.path).await?;
        Ok(())
    }

    async fn persist(&self, mark: &CheckpointMark) -> Result<()> {
        let contents = mark.to_json()?;

        // Write to a temp file first, then rename for atomicity
        let temp_path = self.temp_path();
        if let Err(e) = tokio::fs::write(&temp_path, &contents).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), "checkpoint mark persisted");
        Ok(())
    }

    /// Temp file next to the target, unique per write
    fn temp_path(&self) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.{seq}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    /// Get the checkpoint file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for CheckpointStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            latest: Arc::clone(&self.latest),
        }
    }
}
