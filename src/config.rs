//! Configuration types for upload-service

use crate::error::{Error, Result};
use crate::types::{Header, UploadId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration shared by every upload task
///
/// All fields have defaults, so `{}` is a valid JSON configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Retry policy applied around each task
    #[serde(default)]
    pub retry: RetryConfig,

    /// Reference transport settings
    #[serde(default)]
    pub transport: TransportConfig,

    /// Body streaming settings
    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl Config {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.streaming.buffer_size == 0 {
            return Err(Error::config_key(
                "buffer size must be greater than zero",
                "buffer_size",
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config_key(
                "backoff multiplier must be at least 1.0",
                "backoff_multiplier",
            ));
        }
        Ok(())
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 100 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Settings for the reqwest-backed [`HttpStack`](crate::network::HttpStack)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    /// TCP connect timeout (default: 15 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Whole-request timeout, None = no limit (default: None)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// Follow HTTP redirects (default: true)
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: None,
            follow_redirects: true,
        }
    }
}

/// Body streaming settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Bytes read from a source and written per chunk (default: 4096)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

/// HTTP-level parameters of one upload task
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpUploadParams {
    /// HTTP method (default: "POST")
    #[serde(default = "default_method")]
    pub method: String,

    /// Custom User-Agent; blank or None uses the library default
    #[serde(default)]
    pub custom_user_agent: Option<String>,

    /// Send a Content-Length and stream in fixed-length mode (default: true).
    /// When false the transport uses chunked transfer encoding.
    #[serde(default = "default_true")]
    pub uses_fixed_length_streaming_mode: bool,

    /// Request headers in insertion order; duplicates are kept
    #[serde(default)]
    pub request_headers: Vec<Header>,
}

impl Default for HttpUploadParams {
    fn default() -> Self {
        Self {
            method: default_method(),
            custom_user_agent: None,
            uses_fixed_length_streaming_mode: true,
            request_headers: Vec::new(),
        }
    }
}

impl HttpUploadParams {
    /// Append a header, keeping any existing header with the same name
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.request_headers.push(Header::new(name, value));
        self
    }
}

/// Everything needed to run one upload task
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadTaskParams {
    /// Upload ID
    pub id: UploadId,

    /// Target URL (http or https)
    pub server_url: String,

    /// Source identifiers, streamed in order
    pub sources: Vec<String>,

    /// Delete every source after a successful upload (default: false)
    #[serde(default)]
    pub auto_delete_successfully_uploaded_files: bool,

    /// HTTP-level parameters
    #[serde(default)]
    pub http: HttpUploadParams,
}

impl UploadTaskParams {
    /// Create parameters for a POST of the given sources
    pub fn new(id: impl Into<UploadId>, server_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            server_url: server_url.into(),
            sources: Vec::new(),
            auto_delete_successfully_uploaded_files: false,
            http: HttpUploadParams::default(),
        }
    }

    /// Append a source identifier
    pub fn add_source(&mut self, identifier: impl Into<String>) -> &mut Self {
        self.sources.push(identifier.into());
        self
    }

    /// Validate the URL, method and source list before anything is resolved
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.server_url).map_err(|e| {
            Error::config_key(format!("invalid server URL: {e}"), "server_url")
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config_key(
                format!("server URL must be http or https, got {}", url.scheme()),
                "server_url",
            ));
        }
        if self.http.method.trim().is_empty() {
            return Err(Error::config_key("HTTP method must not be blank", "method"));
        }
        if self.sources.is_empty() {
            return Err(Error::config_key(
                "at least one source is required",
                "sources",
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_buffer_size() -> usize {
    4096
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(100)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(15)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
