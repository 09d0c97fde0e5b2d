//! [`HttpStack`] implementation on top of reqwest
//!
//! The body is produced by the [`RequestBodyDelegate`] writing into one end of
//! an in-memory pipe while reqwest streams the other end to the server. Both
//! sides are driven concurrently on the calling task.
//!
//! In fixed-length mode a response only counts when exactly the declared
//! number of bytes went into the pipe.

use super::body_writer::BodyWriter;
use super::traits::{HttpRequest, HttpStack, RequestBodyDelegate, StreamWriteListener};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Header, ServerResponse, UploadId};
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// reqwest-backed transport
#[derive(Clone, Debug)]
pub struct ReqwestStack {
    client: reqwest::Client,
    buffer_size: usize,
}

impl ReqwestStack {
    /// Build a client from the transport and streaming settings
    pub fn new(config: &Config) -> Result<Self> {
        let redirect = if config.transport.follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.transport.connect_timeout)
            .redirect(redirect);
        if let Some(timeout) = config.transport.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            buffer_size: config.streaming.buffer_size,
        })
    }
}

impl HttpStack for ReqwestStack {
    fn new_request(
        &self,
        upload_id: &UploadId,
        method: &str,
        url: &str,
    ) -> Result<Box<dyn HttpRequest>> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| Error::config_key(format!("invalid HTTP method: {e}"), "method"))?;
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::config_key(format!("invalid server URL: {e}"), "server_url"))?;

        tracing::debug!(upload_id = %upload_id, %method, %url, "new request");

        Ok(Box::new(ReqwestRequest {
            client: self.client.clone(),
            upload_id: upload_id.clone(),
            method,
            url,
            headers: HeaderMap::new(),
            total_bytes: 0,
            fixed_length: true,
            buffer_size: self.buffer_size,
        }))
    }
}

struct ReqwestRequest {
    client: reqwest::Client,
    upload_id: UploadId,
    method: reqwest::Method,
    url: reqwest::Url,
    headers: HeaderMap,
    total_bytes: u64,
    fixed_length: bool,
    buffer_size: usize,
}

#[async_trait]
impl HttpRequest for ReqwestRequest {
    fn set_headers(&mut self, headers: Vec<Header>) -> Result<()> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for header in headers {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|e| Error::config_key(format!("invalid header name: {e}"), &header.name))?;
            let value = HeaderValue::from_str(&header.value).map_err(|e| {
                Error::config_key(format!("invalid header value: {e}"), &header.name)
            })?;
            map.append(name, value);
        }
        self.headers = map;
        Ok(())
    }

    fn set_total_body_bytes(&mut self, total_bytes: u64, fixed_length: bool) {
        self.total_bytes = total_bytes;
        self.fixed_length = fixed_length;
    }

    async fn get_response(
        self: Box<Self>,
        delegate: &dyn RequestBodyDelegate,
        listener: &dyn StreamWriteListener,
    ) -> Result<ServerResponse> {
        let ReqwestRequest {
            client,
            upload_id,
            method,
            url,
            mut headers,
            total_bytes,
            fixed_length,
            buffer_size,
        } = *self;

        if fixed_length {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(total_bytes));
        } else {
            headers.remove(CONTENT_LENGTH);
        }

        let (mut body_tx, body_rx) = tokio::io::duplex(buffer_size.max(1));
        let body = reqwest::Body::wrap_stream(ReaderStream::with_capacity(body_rx, buffer_size));

        let send = client.request(method, url).headers(headers).body(body).send();

        let write = async move {
            let (written, bytes_written) = {
                let mut writer = BodyWriter::new(&mut body_tx, listener, buffer_size);
                let written = match delegate.on_write_request_body(&mut writer).await {
                    Ok(()) => writer.flush().await,
                    Err(e) => Err(e),
                };
                (written, writer.bytes_written())
            };
            // EOF for the reader side, whether or not the body is complete
            body_tx.shutdown().await.ok();
            (written, bytes_written)
        };

        let (sent, (written, bytes_written)) = futures::future::join(send, write).await;

        // An unreadable source means the server saw a truncated body,
        // whatever it answered
        let written = match written {
            Err(source_error @ Error::SourceUnavailable { .. }) => return Err(source_error),
            other => other,
        };

        let response = sent.map_err(Error::Network)?;

        // hyper stops reading at the declared length, so an oversized body can
        // still get a response. A cancelled body is left to the caller's
        // completion rule.
        if fixed_length && listener.should_continue_writing() {
            let mismatch = match &written {
                Err(e) => Some(e.to_string()),
                Ok(()) if bytes_written != total_bytes => {
                    Some(format!("{bytes_written} bytes written"))
                }
                Ok(()) => None,
            };
            if let Some(detail) = mismatch {
                tracing::warn!(
                    upload_id = %upload_id,
                    declared = total_bytes,
                    written = bytes_written,
                    "fixed-length body does not match its declared length"
                );
                return Err(Error::Transport(format!(
                    "fixed-length body declared {total_bytes} bytes: {detail}"
                )));
            }
        }

        if let Err(e) = written {
            tracing::debug!(
                upload_id = %upload_id,
                error = %e,
                "server responded before the body was fully written"
            );
        }
        into_server_response(response).await
    }
}

async fn into_server_response(response: reqwest::Response) -> Result<ServerResponse> {
    let code = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| Header::new(name.as_str(), value))
        })
        .collect();
    let body = response.bytes().await?.to_vec();

    Ok(ServerResponse {
        code,
        body,
        headers,
    })
}
