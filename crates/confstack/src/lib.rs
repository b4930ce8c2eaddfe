//! Layered, environment-aware YAML configuration.
//!
//! This crate re-exports the config building blocks and provides the
//! logging helpers and command-line front end used by the `confstack` binary.

pub mod cli;

/// Re-export for convenience.
pub use confstack_config as config;

use log::LevelFilter;

/// Variable whose filter directives take precedence over the configured level.
pub const RUST_LOG_VAR: &str = "RUST_LOG";

/// Install `env_logger`, capped at `level` unless `RUST_LOG` is set.
///
/// The logger itself accepts every level so the cap can be moved later with
/// [`set_log_level`]. Only the first call installs a logger.
pub fn init_logging(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .format_timestamp_millis()
        .parse_env(RUST_LOG_VAR)
        .try_init();
    set_log_level(level);
}

/// Move the verbosity cap once the configured level is known.
///
/// A no-op when `RUST_LOG` is set.
pub fn set_log_level(level: LevelFilter) {
    if std::env::var_os(RUST_LOG_VAR).is_none() {
        log::set_max_level(level);
    }
}
