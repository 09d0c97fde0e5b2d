//! Upload body capability set and the raw (binary) body

use crate::error::{Error, Result};
use crate::network::BodyWriter;
use crate::schemes::{SchemeHandlerRegistry, SourceHandle};
use crate::types::ServerResponse;
use async_trait::async_trait;

/// What a kind of upload contributes to an attempt
///
/// The executor holds one of these instead of being specialised per upload
/// kind.
#[async_trait]
pub trait UploadBody: Send + Sync {
    /// Exact number of body bytes, used for progress and fixed-length mode
    ///
    /// Fails with [`Error::Config`] when the length cannot be computed.
    async fn body_length(&self) -> Result<u64>;

    /// Stream the body through `writer`
    async fn write_body(&self, writer: &mut BodyWriter<'_>) -> Result<()>;

    /// Content type to send when the caller did not set one
    async fn content_type(&self) -> Option<String> {
        None
    }

    /// Sources eligible for deletion after a successful upload
    fn sources(&self) -> &[Box<dyn SourceHandle>] {
        &[]
    }

    /// Hook called when a response wins the completion race
    async fn on_response_received(&self, _response: &ServerResponse) {}
}

/// Body made of one or more sources sent back to back, unencoded
pub struct RawBody {
    sources: Vec<Box<dyn SourceHandle>>,
}

impl RawBody {
    /// Wrap already resolved sources
    pub fn new(sources: Vec<Box<dyn SourceHandle>>) -> Self {
        Self { sources }
    }

    /// Resolve every identifier up front, so the total length is known
    /// before the request starts
    pub fn resolve<S: AsRef<str>>(
        registry: &SchemeHandlerRegistry,
        identifiers: &[S],
    ) -> Result<Self> {
        let sources = identifiers
            .iter()
            .map(|identifier| registry.resolve(identifier.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sources))
    }
}

#[async_trait]
impl UploadBody for RawBody {
    async fn body_length(&self) -> Result<u64> {
        let mut total: u64 = 0;
        for source in &self.sources {
            total = total.checked_add(source.size().await).ok_or_else(|| {
                Error::config_key("total body length overflows", source.identifier())
            })?;
        }
        Ok(total)
    }

    async fn write_body(&self, writer: &mut BodyWriter<'_>) -> Result<()> {
        for source in &self.sources {
            if !writer.should_continue() {
                break;
            }
            let mut stream = source.open_stream().await?;
            if !writer.write_stream(&mut stream).await? {
                break;
            }
        }
        Ok(())
    }

    async fn content_type(&self) -> Option<String> {
        match self.sources.first() {
            Some(source) => Some(source.content_type().await),
            None => None,
        }
    }

    fn sources(&self) -> &[Box<dyn SourceHandle>] {
        &self.sources
    }
}
