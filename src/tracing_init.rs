//! `tracing-subscriber` bootstrap for binaries embedding this crate.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, defaulting to
/// `info` when unset. Safe to call once per process; subsequent calls are
/// no-ops if a subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
