//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Initialize structured logging; `RUST_LOG` overrides the default level.
/// Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
