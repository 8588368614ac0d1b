//! # Logging Setup
//!
//! ## Overview
//!
//! Structured logging via `tracing`. The engine itself only emits spans
//! and events; this module is how a host process turns them into output.
//! Initialization is explicitly opt-in so embedders that already run a
//! `tracing` subscriber keep full control.
//!
//! The output format defaults to human-readable trees in debug builds
//! and JSON lines in release builds. `RUST_LOG` always wins over the
//! configured level when it is set.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_level(tracing::Level::DEBUG);
//! init_logging(&config)?;
//! ```

use crate::error::{Error, Result};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// Configuration
// ============================================================================

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output with span trees.
    Pretty,
    /// One JSON object per line, for ingestion pipelines.
    Json,
    /// Single-line human-readable output.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

/// Logging configuration consumed by [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Maximum level emitted when no filter overrides it.
    pub level: Level,
    /// Explicit filter directives, e.g. `"core_sync=trace,reqwest=warn"`.
    /// Takes precedence over `level`; `RUST_LOG` takes precedence over both.
    pub filter: Option<String>,
    /// Whether to include the event's module target.
    pub display_target: bool,
    /// Whether to include thread ids and names.
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: Level::INFO,
            filter: None,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Installs the global `tracing` subscriber described by `config`.
///
/// Call at most once per process, before the engine starts.
///
/// # Errors
///
/// Returns [`Error::Config`] when the filter directives fail to parse
/// and [`Error::Internal`] when a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(config.display_target)
                    .with_thread_ids(config.display_thread_info)
                    .with_thread_names(config.display_thread_info),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.display_target)
                    .with_thread_ids(config.display_thread_info)
                    .with_thread_names(config.display_thread_info),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(config.display_target)
                    .with_thread_ids(config.display_thread_info)
                    .with_thread_names(config.display_thread_info),
            )
            .try_init(),
    };

    result.map_err(|e| Error::Internal(format!("failed to initialize logging: {e}")))
}

/// Resolves the effective filter: `RUST_LOG`, then the configured
/// directives, then the plain level.
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    configured_filter(config)
}

fn configured_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match &config.filter {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| Error::Config(format!("invalid log filter '{directives}': {e}"))),
        None => Ok(EnvFilter::new(config.level.to_string())),
    }
}
