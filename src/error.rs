//! Error types for upload-service
//!
//! The taxonomy follows the point at which a failure is detected:
//! - [`Error::Config`] and [`Error::UnsupportedScheme`] are caller-fixable and
//!   surface before any byte is sent
//! - [`Error::SourceUnavailable`] surfaces once the body is being written
//! - [`Error::Transport`] and [`Error::Network`] come from the transport collaborator
//!
//! Non-2xx HTTP responses are not errors; they are delivered as
//! [`ServerResponse`](crate::types::ServerResponse) values.

use thiserror::Error;

/// Result type alias for upload-service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for upload-service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key or header name that caused the error
        key: Option<String>,
    },

    /// No scheme handler is registered for the identifier's scheme
    #[error("unsupported scheme for {identifier}, supported schemes are {supported:?}")]
    UnsupportedScheme {
        /// The source identifier that could not be resolved
        identifier: String,
        /// Schemes registered at the time of resolution
        supported: Vec<String>,
    },

    /// A source could not be opened for reading
    #[error("can't open input stream for {identifier}: {reason}")]
    SourceUnavailable {
        /// The source identifier that could not be opened
        identifier: String,
        /// Why the source could not be opened
        reason: String,
    },

    /// Transport-level failure reported by an [`HttpStack`](crate::network::HttpStack)
    #[error("transport error: {0}")]
    Transport(String),

    /// Network error from the reqwest transport
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error while reading a source or writing the request body
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Config`] without a key
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: None,
        }
    }

    /// Shorthand for a [`Error::Config`] naming the offending key
    pub fn config_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code, carried by [`Event::Error`](crate::types::Event::Error)
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::UnsupportedScheme { .. } => "unsupported_scheme",
            Error::SourceUnavailable { .. } => "source_unavailable",
            Error::Transport(_) => "transport_error",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the error was detected before the attempt touched the network
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::UnsupportedScheme { .. } | Error::Serialization(_)
        )
    }
}
