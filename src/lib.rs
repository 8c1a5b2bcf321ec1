//! # Solidafy Checkpoint
//!
//! Checkpointing for unbounded, partitioned streaming sources.
//!
//! ## Features
//!
//! - **Checkpoint Marks**: Immutable per-split snapshots of partition progress
//! - **Offset Dedup Keys**: Order-preserving byte keys for effectively-once sinks
//! - **Async Offset Commits**: Background flush of finalized offsets to the source
//! - **Split Planning**: One partition per split whenever dedup is enabled
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_checkpoint::{ReaderConfig, Split, SplitReader, TopicPartition};
//!
//! #[tokio::main]
//! async fn main() -> solidafy_checkpoint::Result<()> {
//!     let split = Split::single(0, TopicPartition::new("events", 2));
//!     let reader = SplitReader::start(split, ReaderConfig::default(), committer)?;
//!
//!     // Report records as they are read
//!     reader.advance(&TopicPartition::new("events", 2), 41, None)?;
//!
//!     // Checkpoint, persist, then finalize
//!     let mark = reader.checkpoint_mark();
//!     store.save(&mark).await?;
//!     mark.finalize();
//!
//!     reader.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ checkpoint_mark() ┌────────────────┐ dedup_key() ┌──────┐
//! │ SplitReader  │──────────────────▶│ CheckpointMark │────────────▶│ Sink │
//! └──────┬───────┘                   └───────┬────────┘             └──────┘
//!        │ owns                              │ finalize()
//!        ▼                                   │ (weak ref to reader)
//! ┌───────────────────┐  request_commit()    │
//! │ CommitCoordinator │◀─────────────────────┘
//! │    flush task     │──── commit() every interval ───▶ Source
//! └───────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Order-preserving offset encoding
pub mod codec;

/// Per-partition progress
pub mod partition;

/// Checkpoint marks and their storage
pub mod checkpoint;

/// Offset-based dedup keys
pub mod dedup;

/// Asynchronous offset commits
pub mod commit;

/// Split planning
pub mod split;

/// Split reader
pub mod reader;

/// Reader configuration
pub mod config;

/// Logging setup
pub mod logging;

// ============================================================================
// Re-exports
// ============================================================================

pub use checkpoint::{CheckpointMark, CheckpointReader, CheckpointStore, ReaderRef};
pub use codec::{decode_offset, encode_offset, DedupKey};
pub use commit::{CommitCoordinator, CommitStats, CommitStatus, OffsetCommitter};
pub use config::{CommitConfig, ReaderConfig};
pub use error::{Error, Result};
pub use partition::PartitionMark;
pub use reader::SplitReader;
pub use split::{plan_splits, Split};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
