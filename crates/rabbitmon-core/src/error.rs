//! Error types carrying the identity of the failing operation

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds organized by layer
///
/// Every variant raised by the adapter or the entity model names the
/// operation (resource path or logical name) that failed.
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Transport Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Transport error in {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("Resource not found: {operation}")]
    NotFound { operation: String },

    // ─────────────────────────────────────────────────────────────
    // Protocol Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Protocol error in {operation}: {message}")]
    Protocol { operation: String, message: String },

    #[error("Failed to decode response of {operation}: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No request dialect for management version {version} in {operation}")]
    UnsupportedVersion { operation: String, version: String },

    #[error("Unsupported operation {operation}: {message}")]
    UnsupportedOperation { operation: String, message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    // ─────────────────────────────────────────────────────────────
    // Version Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid version {text:?}: {message}")]
    InvalidVersion { text: String, message: String },

    #[error("Cannot compare versions {left} and {right} without a fill value")]
    VersionMismatch { left: String, right: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn not_found(operation: impl Into<String>) -> Self {
        Self::NotFound {
            operation: operation.into(),
        }
    }

    pub fn protocol(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn decode(operation: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            operation: operation.into(),
            source,
        }
    }

    pub fn unsupported_version(operation: impl Into<String>, version: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            operation: operation.into(),
            version: version.into(),
        }
    }

    pub fn unsupported_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn invalid_version(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidVersion {
            text: text.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error came from the transport (network or HTTP status)
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::NotFound { .. })
    }

    /// Check if this error was raised before any request was sent because
    /// no request body can express the call
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedVersion { .. } | Error::UnsupportedOperation { .. }
        )
    }

    /// The operation this error refers to, when it carries one
    pub fn operation(&self) -> Option<&str> {
        match self {
            Error::Transport { operation, .. }
            | Error::NotFound { operation }
            | Error::Protocol { operation, .. }
            | Error::Decode { operation, .. }
            | Error::UnsupportedVersion { operation, .. }
            | Error::UnsupportedOperation { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
