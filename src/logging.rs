//! Logging setup
//!
//! The crate only emits `tracing` events. Embedding applications normally
//! install their own subscriber; `init` is a convenience for binaries and
//! tests that do not.

use tracing_subscriber::EnvFilter;

/// Install a formatted subscriber filtered by `RUST_LOG` (default `info`)
///
/// Safe to call more than once: if a global subscriber is already set, the
/// call does nothing.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    init_with_filter(filter);
}

/// Install a formatted subscriber with an explicit filter
pub fn init_with_filter(filter: EnvFilter) {
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        tracing::debug!("global tracing subscriber already set, keeping it");
    }
}
