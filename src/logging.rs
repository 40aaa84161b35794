//! Logging setup for hosts that embed the monitor
//!
//! Embedding servers usually bring their own `tracing` subscriber; this
//! helper is for standalone use (demos, soak tests) where nothing else has
//! installed one.

use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize dual-output logging: stdout plus `opsmon.log`
///
/// Both outputs take their level from `RUST_LOG`, defaulting to `info`.
/// Panics if a global subscriber is already installed, so call it at most
/// once and only when the host has not set one up.
pub fn init_dual_logging() {
    let file_appender = tracing_appender::rolling::never(".", "opsmon.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let file_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(stdout_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .init();

    // The appender flushes from a background thread for as long as the
    // guard lives; leak it so logging works for the program lifetime.
    std::mem::forget(guard);
}
