//! Error types for the WebDAV provider

use thiserror::Error;

/// WebDAV provider errors
#[derive(Error, Debug)]
pub enum WebDavError {
    /// Endpoint configuration is unusable
    #[error("Invalid WebDAV configuration: {0}")]
    InvalidConfig(String),

    /// Server answered with a non-success status
    #[error("WebDAV server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Connection-level failure (DNS, TLS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// PROPFIND listing body could not be understood
    #[error("Malformed multistatus listing: {0}")]
    Listing(String),

    /// Backup document failed to serialize or deserialize
    #[error("Backup document error: {0}")]
    Document(String),
}

/// Result type for WebDAV operations
pub type Result<T> = std::result::Result<T, WebDavError>;

// The orchestrator treats every provider failure as a transport failure;
// the variant distinctions only matter inside this crate.
impl From<WebDavError> for core_sync::SyncError {
    fn from(error: WebDavError) -> Self {
        core_sync::SyncError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = WebDavError::Server {
            status: 507,
            message: "Insufficient Storage".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "WebDAV server error (status 507): Insufficient Storage"
        );
    }

    #[test]
    fn test_error_conversion() {
        let error = WebDavError::Network("connection refused".to_string());
        let sync_error: core_sync::SyncError = error.into();

        match sync_error {
            core_sync::SyncError::Transport(message) => {
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }
}
