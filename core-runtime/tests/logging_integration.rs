//! Integration tests for logging configuration.

use core_runtime::logging::{LogFormat, LoggingConfig};
use tracing::Level;

#[test]
fn test_logging_config_builder() {
    // We can only install a global subscriber once per process, so these
    // tests exercise the configuration surface rather than init itself.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(Level::DEBUG)
        .with_filter("core_sync=trace");

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, Level::DEBUG);
    assert_eq!(config.filter.as_deref(), Some("core_sync=trace"));
}

#[test]
fn test_format_selection() {
    // Debug builds default to Pretty.
    #[cfg(debug_assertions)]
    {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
    }

    // Release builds default to JSON.
    #[cfg(not(debug_assertions))]
    {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Json);
    }
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(Level::WARN)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, Level::WARN);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
