//! Single-attempt HTTP upload executor

use super::body::UploadBody;
use super::headers::{request_headers, validate_headers};
use super::state::{CancelHandle, UploadState};
use crate::config::UploadTaskParams;
use crate::error::Result;
use crate::network::{BodyWriter, HttpStack, RequestBodyDelegate, StreamWriteListener};
use crate::types::{Event, ServerResponse, UploadId, UploadOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Executes one upload attempt
///
/// The executor is both the transport's body delegate and its write
/// listener. It owns a fresh [`UploadState`] and shares only the
/// [`CancelHandle`] with the rest of the task; a retry builds a new executor.
pub struct HttpUploadTask {
    params: UploadTaskParams,
    body: Arc<dyn UploadBody>,
    state: UploadState,
    event_tx: broadcast::Sender<Event>,
}

impl HttpUploadTask {
    /// Create an executor for one attempt
    pub fn new(
        params: UploadTaskParams,
        body: Arc<dyn UploadBody>,
        cancel: CancelHandle,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            params,
            body,
            state: UploadState::new(cancel),
            event_tx,
        }
    }

    /// Upload ID
    pub fn id(&self) -> &UploadId {
        &self.params.id
    }

    /// Parameters of this attempt, as supplied by the caller
    pub fn params(&self) -> &UploadTaskParams {
        &self.params
    }

    /// State of this attempt
    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// Handle that cancels this attempt (and the task it belongs to)
    pub fn cancel_handle(&self) -> CancelHandle {
        self.state.cancel_handle().clone()
    }

    /// Request cancellation; see [`CancelHandle::cancel`]
    pub fn cancel(&self) -> bool {
        self.state.cancel_handle().cancel()
    }

    /// Whether the attempt ended with a successful, non-cancelled response
    pub fn all_files_successfully_uploaded(&self) -> bool {
        self.state.all_files_successfully_uploaded()
    }

    /// Run the attempt against `stack`
    ///
    /// Header and body-length problems fail with
    /// [`Error::Config`](crate::Error::Config) before the transport is
    /// touched. Transport failures are returned as-is. Any HTTP status is a
    /// response: if the upload was not cancelled by the time it arrives the
    /// result is [`UploadOutcome::Responded`], otherwise
    /// [`UploadOutcome::Cancelled`] and no completion signal fires.
    pub async fn execute(&self, stack: &dyn HttpStack) -> Result<UploadOutcome> {
        let id = &self.params.id;
        tracing::debug!(upload_id = %id, "Starting upload task");

        let headers = request_headers(&self.params.http, self.body.content_type().await);

        self.state.reset();
        let total_bytes = self.body.body_length().await?;
        self.state.set_total_bytes(total_bytes);

        validate_headers(&headers)?;

        let mut request = stack.new_request(id, &self.params.http.method, &self.params.server_url)?;
        request.set_headers(headers)?;
        request.set_total_body_bytes(total_bytes, self.params.http.uses_fixed_length_streaming_mode);

        let response = request.get_response(self, self).await?;

        tracing::debug!(
            upload_id = %id,
            code = response.code,
            body = %response.body_string(),
            "Server responded"
        );

        Ok(self.resolve_completion(response).await)
    }

    /// Decide whether the response or a cancellation wins
    ///
    /// A server may still answer (even with 200) after the client stopped
    /// writing a cancelled body. Such a response is dropped so that callers
    /// never see a completion followed by a cancellation.
    async fn resolve_completion(&self, response: ServerResponse) -> UploadOutcome {
        if !self.state.cancel_handle().claim_response() {
            tracing::debug!(
                upload_id = %self.params.id,
                code = response.code,
                "Upload cancelled, ignoring server response"
            );
            return UploadOutcome::Cancelled;
        }

        let successful = response.is_successful();
        if successful {
            self.state.mark_successful();
        }

        self.body.on_response_received(&response).await;
        self.event_tx
            .send(Event::ResponseReceived {
                id: self.params.id.clone(),
                response: response.clone(),
            })
            .ok();

        if successful && self.params.auto_delete_successfully_uploaded_files {
            self.delete_sources().await;
        }

        UploadOutcome::Responded(response)
    }

    async fn delete_sources(&self) {
        for source in self.body.sources() {
            if source.delete().await {
                tracing::debug!(
                    upload_id = %self.params.id,
                    identifier = source.identifier(),
                    "Deleted uploaded source"
                );
            } else {
                tracing::warn!(
                    upload_id = %self.params.id,
                    identifier = source.identifier(),
                    "Error while deleting uploaded source"
                );
            }
        }
    }
}

#[async_trait]
impl RequestBodyDelegate for HttpUploadTask {
    async fn on_write_request_body(&self, writer: &mut BodyWriter<'_>) -> Result<()> {
        self.body.write_body(writer).await
    }
}

impl StreamWriteListener for HttpUploadTask {
    fn should_continue_writing(&self) -> bool {
        self.state.cancel_handle().should_continue()
    }

    fn on_bytes_written(&self, bytes_written: usize) {
        if bytes_written == 0 {
            return;
        }
        let Some(uploaded_bytes) = self.state.add_transferred(bytes_written as u64) else {
            return;
        };
        self.event_tx
            .send(Event::Progress {
                id: self.params.id.clone(),
                uploaded_bytes,
                total_bytes: self.state.total_bytes(),
            })
            .ok();
    }
}
