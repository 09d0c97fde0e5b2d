//! Traits and shared helpers for source resolution

use crate::error::Result;
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Content type used when a source's type cannot be determined
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Readable byte stream of one source
///
/// Single-use: whoever opens it owns it, and dropping it closes it.
pub type SourceStream = Box<dyn AsyncRead + Send + Unpin>;

/// Uniform view of one data source
///
/// Only [`open_stream`](SourceHandle::open_stream) can fail. Metadata lookups
/// collapse to documented fallbacks (size `0`, `application/octet-stream`,
/// last path segment of the identifier) and deletion reports failure as
/// `false`.
#[async_trait]
pub trait SourceHandle: Send + Sync {
    /// The identifier this handle was resolved from
    fn identifier(&self) -> &str;

    /// Size in bytes, `0` when the size is unavailable
    async fn size(&self) -> u64;

    /// Open a fresh readable stream over the source's bytes
    ///
    /// Fails with [`Error::SourceUnavailable`](crate::Error::SourceUnavailable)
    /// when no stream can be produced.
    async fn open_stream(&self) -> Result<SourceStream>;

    /// MIME type of the source
    async fn content_type(&self) -> String;

    /// Human-readable name of the source
    async fn display_name(&self) -> String;

    /// Delete the source, returning whether anything was deleted
    async fn delete(&self) -> bool;
}

/// Resolves identifiers of one scheme into [`SourceHandle`]s
///
/// Each call creates a fresh handle; handles are not cached.
pub trait SchemeHandler: Send + Sync {
    /// Resolve an identifier whose scheme this handler was registered for
    fn resolve(&self, identifier: &str) -> Result<Box<dyn SourceHandle>>;
}

/// Last `/`-separated segment of an identifier
///
/// `content://media/external/images/42` gives `42`. A trailing slash yields
/// an empty segment, in which case the whole identifier is returned.
pub fn last_path_segment(identifier: &str) -> &str {
    match identifier.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => identifier,
    }
}
