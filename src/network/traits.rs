//! Transport collaborator traits

use super::body_writer::BodyWriter;
use crate::error::Result;
use crate::types::{Header, ServerResponse, UploadId};
use async_trait::async_trait;

/// Factory for HTTP requests
///
/// The upload core depends only on this shape, never on a concrete network
/// stack. Connection setup, TLS, redirects and timeouts belong to the
/// implementation.
pub trait HttpStack: Send + Sync {
    /// Start a new request for an upload
    fn new_request(
        &self,
        upload_id: &UploadId,
        method: &str,
        url: &str,
    ) -> Result<Box<dyn HttpRequest>>;
}

/// A single HTTP request being prepared and then executed
#[async_trait]
pub trait HttpRequest: Send {
    /// Set the request headers, in order
    fn set_headers(&mut self, headers: Vec<Header>) -> Result<()>;

    /// Declare the body length and whether to stream it in fixed-length mode
    ///
    /// When `fixed_length` is false the body is sent with chunked transfer
    /// encoding and `total_bytes` is informational.
    fn set_total_body_bytes(&mut self, total_bytes: u64, fixed_length: bool);

    /// Execute the request
    ///
    /// The implementation builds a [`BodyWriter`] over its outgoing sink and
    /// hands it to `delegate`; the writer reports to `listener`. Any HTTP
    /// status is a response; only failures below HTTP are errors.
    async fn get_response(
        self: Box<Self>,
        delegate: &dyn RequestBodyDelegate,
        listener: &dyn StreamWriteListener,
    ) -> Result<ServerResponse>;
}

/// Supplies the request body on demand
#[async_trait]
pub trait RequestBodyDelegate: Send + Sync {
    /// Write the whole body through `writer`
    ///
    /// Returning `Ok(())` after the writer reported cancellation is expected;
    /// the transport then finishes or aborts the request as it sees fit.
    async fn on_write_request_body(&self, writer: &mut BodyWriter<'_>) -> Result<()>;
}

/// Receives per-chunk notifications from a [`BodyWriter`]
pub trait StreamWriteListener: Send + Sync {
    /// Polled before every chunk; `false` stops the writer without an error
    fn should_continue_writing(&self) -> bool;

    /// Called after every chunk with its (positive) size in bytes
    fn on_bytes_written(&self, bytes_written: usize);
}
