//! Upload task runner: retries, fresh executors per attempt, lifecycle events

use super::body::RawBody;
use super::executor::HttpUploadTask;
use super::state::CancelHandle;
use crate::config::{Config, UploadTaskParams};
use crate::error::Result;
use crate::network::HttpStack;
use crate::retry::upload_with_retry;
use crate::schemes::SchemeHandlerRegistry;
use crate::types::{Event, UploadId, UploadOutcome};
use std::sync::Arc;
use tokio::sync::broadcast;

/// A configured upload, run to completion with retries
///
/// Every attempt resolves the sources again and runs a new
/// [`HttpUploadTask`]. Events for the whole task go to one broadcast channel:
/// progress and responses from attempts, then exactly one of
/// [`Event::Completed`], [`Event::Cancelled`] or [`Event::Error`].
pub struct UploadTask {
    params: UploadTaskParams,
    config: Arc<Config>,
    registry: Arc<SchemeHandlerRegistry>,
    event_tx: broadcast::Sender<Event>,
    cancel: CancelHandle,
}

impl UploadTask {
    /// Create a task; nothing runs until [`run`](UploadTask::run)
    pub fn new(
        params: UploadTaskParams,
        config: Arc<Config>,
        registry: Arc<SchemeHandlerRegistry>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            params,
            config,
            registry,
            event_tx,
            cancel: CancelHandle::new(),
        }
    }

    /// Identifier shared by every attempt and event of this task
    pub fn id(&self) -> &UploadId {
        &self.params.id
    }

    /// Handle that cancels the running attempt and any later retry
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Subscribe to this task's events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run attempts until one gets a response, the task is cancelled, or a
    /// non-retryable error (or the retry budget) ends it
    pub async fn run(&self, stack: &dyn HttpStack) -> Result<UploadOutcome> {
        let id = self.params.id.clone();

        let result = match self.params.validate() {
            Ok(()) => upload_with_retry(&self.config.retry, || self.attempt(stack)).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(UploadOutcome::Responded(response)) => {
                tracing::info!(upload_id = %id, code = response.code, "Upload completed");
                self.event_tx
                    .send(Event::Completed {
                        id,
                        successful: response.is_successful(),
                    })
                    .ok();
            }
            Ok(UploadOutcome::Cancelled) => {
                tracing::info!(upload_id = %id, "Upload cancelled");
                self.event_tx.send(Event::Cancelled { id }).ok();
            }
            Err(e) => {
                self.event_tx
                    .send(Event::Error {
                        id,
                        code: e.error_code().to_string(),
                        error: e.to_string(),
                    })
                    .ok();
            }
        }
        result
    }

    async fn attempt(&self, stack: &dyn HttpStack) -> Result<UploadOutcome> {
        if self.cancel.is_cancelled() {
            return Ok(UploadOutcome::Cancelled);
        }

        let body = RawBody::resolve(&self.registry, &self.params.sources)?;
        let executor = HttpUploadTask::new(
            self.params.clone(),
            Arc::new(body),
            self.cancel.clone(),
            self.event_tx.clone(),
        );

        match executor.execute(stack).await {
            // Aborting the body usually makes the transport fail; that is the
            // cancellation, not an error worth retrying
            Err(e) if self.cancel.is_cancelled() => {
                tracing::debug!(
                    upload_id = %self.params.id,
                    error = %e,
                    "transport failed after cancellation"
                );
                Ok(UploadOutcome::Cancelled)
            }
            other => other,
        }
    }
}
