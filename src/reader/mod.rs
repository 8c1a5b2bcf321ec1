//! Reader module
//!
//! The reader side of the checkpoint protocol: per-split progress tracking,
//! checkpoint mark creation and finalize dispatch into the commit coordinator.

mod split_reader;

pub use split_reader::SplitReader;
