//! Tracing subscriber initialization shared by the Ariadne binaries

use crate::config::LogLevel;
use tracing_subscriber::EnvFilter;

/// Build the filter for `level`. `RUST_LOG`, when set and valid, wins.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.filter_directive()))
}

/// Install the global fmt subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_tracing(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .try_init();
}

/// Same as [`init_tracing`] but writes to stderr, keeping stdout free for
/// command output
pub fn init_tracing_stderr(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
