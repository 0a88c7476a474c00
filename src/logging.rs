//! Logger setup for native builds.

use crate::config::LogLevel;

/// Install `env_logger` at `level`. `RUST_LOG`, when set, overrides it.
///
/// Safe to call more than once; later calls only log a debug message.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(level: LogLevel) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.to_level_filter());
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    match builder.try_init() {
        Ok(()) => log::debug!("Logger initialized at {}", level.name()),
        Err(_) => log::debug!("Logger already initialized"),
    }
}

/// Change the maximum level of the installed logger.
pub fn set_level(level: LogLevel) {
    log::set_max_level(level.to_level_filter());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init(LogLevel::Warn);
        init(LogLevel::Debug);
    }
}
