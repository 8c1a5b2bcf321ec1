//! Configuration types for checkpointing readers
//!
//! Reader configuration is usually embedded in a larger pipeline definition,
//! so every structure here deserializes from YAML or JSON with sensible
//! defaults for missing fields.

use crate::error::{Error, Result};
use crate::types::DedupMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default commit flush interval, matching the source poll timeout
pub const DEFAULT_COMMIT_INTERVAL: Duration = Duration::from_secs(1);

/// Default upper bound on a single offset commit call
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Reader Config
// ============================================================================

/// Configuration for a split reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Dedup mode the downstream sink expects
    #[serde(default)]
    pub dedup_mode: DedupMode,

    /// Commit consumed offsets back to the source when marks are finalized
    #[serde(default = "default_true")]
    pub commit_offsets_in_finalize: bool,

    /// Commit coordinator settings
    #[serde(default)]
    pub commit: CommitConfig,
}

fn default_true() -> bool {
    true
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            dedup_mode: DedupMode::None,
            commit_offsets_in_finalize: true,
            commit: CommitConfig::default(),
        }
    }
}

impl ReaderConfig {
    /// Create a new reader config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set dedup mode
    #[must_use]
    pub fn with_dedup_mode(mut self, mode: DedupMode) -> Self {
        self.dedup_mode = mode;
        self
    }

    /// Enable or disable committing offsets on finalize
    #[must_use]
    pub fn with_commit_offsets_in_finalize(mut self, enabled: bool) -> Self {
        self.commit_offsets_in_finalize = enabled;
        self
    }

    /// Set the commit flush interval
    #[must_use]
    pub fn with_commit_interval(mut self, interval: Duration) -> Self {
        self.commit.interval = interval;
        self
    }

    /// Set the per-call commit timeout
    #[must_use]
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit.commit_timeout = timeout;
        self
    }

    /// Parse config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Check values that deserialization alone cannot
    pub fn validate(&self) -> Result<()> {
        self.commit.validate()
    }

    /// Whether marks need a live reader back-reference
    pub fn binds_reader(&self) -> bool {
        self.commit_offsets_in_finalize || self.dedup_mode.is_offset_based()
    }
}

// ============================================================================
// Commit Config
// ============================================================================

/// Configuration for the background offset commit loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitConfig {
    /// Time between flushes of pending offsets (e.g. "500ms", "1s")
    #[serde(default = "default_interval", with = "duration_str")]
    pub interval: Duration,

    /// Longest a single commit call may take before it counts as failed
    #[serde(default = "default_commit_timeout", with = "duration_str")]
    pub commit_timeout: Duration,
}

fn default_interval() -> Duration {
    DEFAULT_COMMIT_INTERVAL
}

fn default_commit_timeout() -> Duration {
    DEFAULT_COMMIT_TIMEOUT
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_COMMIT_INTERVAL,
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
        }
    }
}

impl CommitConfig {
    /// Create a commit config with the given interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Set the per-call commit timeout
    #[must_use]
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    /// Check both durations are usable by a timer
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(Error::invalid_value(
                "commit.interval",
                "must be greater than zero",
            ));
        }
        if self.commit_timeout.is_zero() {
            return Err(Error::invalid_value(
                "commit.commit_timeout",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Duration Parsing
// ============================================================================

/// Parse a duration string like "250ms", "1s", "5m", "1h"
///
/// A bare number is taken as milliseconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, "s")
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, "m")
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, "h")
    } else {
        (s, "ms")
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("Invalid duration number: {num_str}")))?;

    let duration = match unit {
        "ms" => Duration::from_millis(num),
        "s" => Duration::from_secs(num),
        "m" => Duration::from_secs(num.saturating_mul(60)),
        "h" => Duration::from_secs(num.saturating_mul(3600)),
        _ => return Err(Error::config(format!("Invalid duration suffix: {unit}"))),
    };

    Ok(duration)
}

mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}ms", value.as_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
