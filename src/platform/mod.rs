//! Platform glue
//!
//! Logger installation plus the wall clock and calendar date. On wasm32 the
//! browser console is the log target; natively `RUST_LOG` controls
//! env_logger.

use chrono::{DateTime, Datelike, Utc};

use crate::sim::rng::date_key;

/// Install the platform logger. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(verbose: bool) {
    use env_logger::{Builder, Env};

    let level = if verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));
    // Fails only when a logger is already installed
    let _ = builder.try_init();
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging(verbose: bool) {
    console_error_panic_hook::set_once();
    let level = if verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    let _ = console_log::init_with_level(level);
}

/// Wall-clock milliseconds since the Unix epoch
pub fn now_ms() -> f64 {
    Utc::now().timestamp_millis() as f64
}

/// Date key for `now`, `YYYY-M-D` without zero padding
pub fn date_key_for(now: DateTime<Utc>) -> String {
    date_key(now.year(), now.month(), now.day())
}

/// Today's UTC date key
pub fn utc_date_key() -> String {
    date_key_for(Utc::now())
}
