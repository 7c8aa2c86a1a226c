//! Logging bootstrap
//!
//! Both daemons log to stdout through `tracing` with an env-filter level
//! taken from `THERMOVEIL_LOG`. The alarm and status sinks (see
//! [`crate::sink`]) ride on the same subscriber.

/// Initialize the global tracing subscriber.
///
/// Call once, before any other startup phase that logs.
pub fn init() {
    let log_level = std::env::var("THERMOVEIL_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(log_level)
        .init();
}
