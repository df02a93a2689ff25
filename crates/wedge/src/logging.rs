//! Tracing subscriber setup

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Install the global fmt subscriber
///
/// `level` comes from the configuration file; `verbose` raises it to debug.
/// `RUST_LOG` directives are applied on top.
pub fn setup_logging(level: LogLevel, verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        level.level_filter()
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .init();
}
