//! One-time process-wide logging initialization. Never reinitialized or
//! mutated after startup; the only global state this crate carries.

use tracing_subscriber::EnvFilter;

/// Initializes a structured `tracing` subscriber at the given level. Safe to
/// call at most once per process; call it from `main` before starting the
/// server.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}
