//! Tracing initialization for binaries and tests.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber with env-filter support.
///
/// Filter via `RUST_LOG` (e.g. `RUST_LOG=vigil=debug`); defaults to
/// `info`. Safe to call more than once — later calls are no-ops, so test
/// helpers can call it unconditionally.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
