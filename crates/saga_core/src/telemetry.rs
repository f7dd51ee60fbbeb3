//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `debug` is used when `verbose` is set
/// and `info` when it is not. Calling this twice is harmless: the second
/// installation attempt is ignored.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
