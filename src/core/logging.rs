//! Leveled job logging.
//!
//! Jobs log through the `log` facade. The level is read from `LOG_LEVEL`
//! using the level names operators already set for the upload pipeline
//! (`DEBUG`, `INFO`, `WARNING`, `ERROR`, `CRITICAL`).

use log::LevelFilter;

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_uppercase().as_str() {
        "NOTSET" | "TRACE" => Some(LevelFilter::Trace),
        "DEBUG" => Some(LevelFilter::Debug),
        "INFO" => Some(LevelFilter::Info),
        "WARNING" | "WARN" => Some(LevelFilter::Warn),
        "ERROR" | "CRITICAL" | "FATAL" => Some(LevelFilter::Error),
        "OFF" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// Level for a job: `LOG_LEVEL` when it names a known level, otherwise `default_level`.
pub fn resolve_level(env_value: Option<&str>, default_level: &str) -> LevelFilter {
    env_value
        .and_then(parse_level)
        .or_else(|| parse_level(default_level))
        .unwrap_or(LevelFilter::Warn)
}

/// Install the stderr logger. Safe to call more than once.
pub fn init(default_level: &str) {
    let env_value = std::env::var(LOG_LEVEL_ENV).ok();
    let level = resolve_level(env_value.as_deref(), default_level);

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis()
        .try_init();
}
