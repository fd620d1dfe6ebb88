//! Logging setup on top of `tracing-subscriber`.
//!
//! Log lines go to stderr so stdout stays free for the JSON result.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber.
///
/// # Environment
/// - `RUST_LOG`: filter directives (default: `info`),
///   e.g. `RUST_LOG=load_planner=debug`
///
/// # Examples
/// ```no_run
/// load_planner::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Installs a debug-level subscriber that writes through the test harness.
///
/// Safe to call from several tests; only the first call takes effect.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
