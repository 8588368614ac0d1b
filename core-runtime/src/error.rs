//! # Runtime Error Types
//!
//! Errors raised while assembling and operating the runtime itself, as
//! opposed to domain errors from the journal or sync layers.

use thiserror::Error;

/// Errors produced by runtime configuration and service wiring.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is incomplete or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required platform capability was not supplied.
    #[error("Missing capability '{capability}': {message}")]
    CapabilityMissing { capability: String, message: String },

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience result alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
