//! Error types for Solidafy Checkpoint
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Only [`Error::Commit`] is recoverable: it is produced by offset committers
//! and contained inside the commit coordinator. Everything else aborts the
//! operation that raised it.

use thiserror::Error;

/// The main error type for Solidafy Checkpoint
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Checkpoint Errors
    // ============================================================================
    #[error("Partition topology violated: expected {expected} partition(s) per split, found {actual}")]
    PartitionTopology { expected: usize, actual: usize },

    #[error("Invalid partition mark for topic '{topic}': {message}")]
    InvalidPartitionMark { topic: String, message: String },

    #[error("Checkpoint error: {message}")]
    Checkpoint { message: String },

    #[error("Partition error for '{partition}': {message}")]
    Partition { partition: String, message: String },

    #[error("Failed to decode offset key: {message}")]
    Decode { message: String },

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("Offset commit failed for '{partition}': {message}")]
    Commit { partition: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a topology error for a split carrying the wrong number of partitions
    pub fn topology(expected: usize, actual: usize) -> Self {
        Self::PartitionTopology { expected, actual }
    }

    /// Create an invalid partition mark error
    pub fn invalid_mark(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPartitionMark {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a checkpoint error
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: message.into(),
        }
    }

    /// Create a partition error
    pub fn partition(partition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Partition {
            partition: partition.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a commit error
    pub fn commit(partition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Commit {
            partition: partition.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Offset commits are retried on the next flush tick. Configuration and
    /// topology errors point at a planning bug and are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Commit { .. })
    }
}

/// Result type alias for Solidafy Checkpoint
pub type Result<T> = std::result::Result<T, Error>;
