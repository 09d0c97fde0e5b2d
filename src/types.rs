//! Core types for upload-service

use serde::{Deserialize, Serialize};

/// Unique identifier for an upload task
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(pub String);

impl UploadId {
    /// Create a new UploadId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UploadId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UploadId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single HTTP header as a (name, value) pair
///
/// Header lists are ordered and may contain duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name
    pub name: String,
    /// Header value
    pub value: String,
}

impl Header {
    /// Create a new header
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison, per HTTP header semantics
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Response delivered by the transport once the request completes
///
/// Any status code is a valid response; interpreting it is left to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResponse {
    /// HTTP status code
    pub code: u16,
    /// Raw response body
    #[serde(default)]
    pub body: Vec<u8>,
    /// Response headers
    #[serde(default)]
    pub headers: Vec<Header>,
}

impl ServerResponse {
    /// Create a response with a status code and body
    pub fn new(code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Whether the status code denotes a successful upload (2xx or 3xx)
    pub fn is_successful(&self) -> bool {
        (200..=399).contains(&self.code)
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Outcome of a single upload attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The response won; the caller decides what its status code means
    Responded(ServerResponse),
    /// Cancellation was requested before the response was delivered
    Cancelled,
}

/// Event emitted during the upload lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Bytes were written to the transport
    Progress {
        /// Upload ID
        id: UploadId,
        /// Cumulative bytes written in the current attempt
        uploaded_bytes: u64,
        /// Expected body length of the current attempt
        total_bytes: u64,
    },

    /// The server responded and the upload was not cancelled
    ResponseReceived {
        /// Upload ID
        id: UploadId,
        /// The server response, successful or not
        response: ServerResponse,
    },

    /// The task finished (after a response was received)
    Completed {
        /// Upload ID
        id: UploadId,
        /// Whether the final response was successful
        successful: bool,
    },

    /// The task was cancelled by the user
    Cancelled {
        /// Upload ID
        id: UploadId,
    },

    /// The task failed with a non-retryable error or ran out of retries
    Error {
        /// Upload ID
        id: UploadId,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },
}

impl Event {
    /// The upload this event belongs to
    pub fn id(&self) -> &UploadId {
        match self {
            Event::Progress { id, .. }
            | Event::ResponseReceived { id, .. }
            | Event::Completed { id, .. }
            | Event::Cancelled { id }
            | Event::Error { id, .. } => id,
        }
    }
}
