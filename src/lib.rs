//! # upload-service
//!
//! Streaming HTTP upload executor with pluggable source resolution.
//!
//! ## Design Philosophy
//!
//! upload-service is designed to be:
//! - **Transport-agnostic** - The core only talks to an [`HttpStack`]; [`ReqwestStack`] is provided
//! - **Scheme-pluggable** - Sources are resolved by a [`SchemeHandlerRegistry`] you populate
//! - **Cancellable** - A cancelled upload never reports success, even if the server answered
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use upload_service::{Config, ReqwestStack, SchemeHandlerRegistry, UploadTask, UploadTaskParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let registry = Arc::new(SchemeHandlerRegistry::with_defaults());
//!     let stack = ReqwestStack::new(&config)?;
//!
//!     let mut params = UploadTaskParams::new("photo-1", "https://uploads.example.com/files");
//!     params.add_source("/tmp/photo.jpg");
//!     params.http.add_header("Authorization", "Bearer token");
//!
//!     let (events_tx, mut events) = tokio::sync::broadcast::channel(256);
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let task = UploadTask::new(params, config, registry, events_tx);
//!     let outcome = task.run(&stack).await?;
//!     println!("{:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// HTTP transport abstraction and the reqwest implementation
pub mod network;
/// Retry logic with exponential backoff
pub mod retry;
/// Source resolution by identifier scheme
pub mod schemes;
/// Core types and events
pub mod types;
/// Upload executor and task runner
pub mod upload;

// Re-export commonly used types
pub use config::{Config, HttpUploadParams, RetryConfig, TransportConfig, UploadTaskParams};
pub use error::{Error, Result};
pub use network::{HttpRequest, HttpStack, ReqwestStack};
pub use schemes::{
    ContentProvider, ContentSchemeHandler, FileSchemeHandler, SchemeHandler,
    SchemeHandlerRegistry, SourceHandle,
};
pub use types::{Event, Header, ServerResponse, UploadId, UploadOutcome};
pub use upload::{CancelHandle, HttpUploadTask, RawBody, UploadBody, UploadTask};

/// Run an upload task, cancelling it on a termination signal
///
/// On a signal the task is cancelled and the running attempt is awaited, so
/// the returned outcome is [`UploadOutcome::Cancelled`] unless a response
/// had already been accepted.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use upload_service::{
///     Config, ReqwestStack, SchemeHandlerRegistry, UploadTask, UploadTaskParams,
///     run_with_shutdown,
/// };
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Arc::new(Config::default());
///     let stack = ReqwestStack::new(&config)?;
///     let mut params = UploadTaskParams::new("backup", "https://uploads.example.com/files");
///     params.add_source("/var/backups/db.tar");
///
///     let (events_tx, _events) = tokio::sync::broadcast::channel(64);
///     let task = UploadTask::new(
///         params,
///         config,
///         Arc::new(SchemeHandlerRegistry::with_defaults()),
///         events_tx,
///     );
///
///     // Ctrl+C cancels the upload instead of killing it mid-request
///     run_with_shutdown(&task, &stack).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(task: &UploadTask, stack: &dyn HttpStack) -> Result<UploadOutcome> {
    let run = task.run(stack);
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => return result,
        _ = wait_for_signal() => {
            tracing::info!(upload_id = %task.id(), "cancelling upload for shutdown");
            task.cancel_handle().cancel();
        }
    }

    run.await
}

/// Resolves on SIGTERM or SIGINT, or on Ctrl+C where unix signals are unavailable
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut terminate), Ok(mut interrupt)) => {
            let name = tokio::select! {
                _ = terminate.recv() => "SIGTERM",
                _ = interrupt.recv() => "SIGINT",
            };
            tracing::info!(signal = name, "shutdown signal received");
        }
        (Ok(mut only), Err(e)) | (Err(e), Ok(mut only)) => {
            tracing::warn!(error = %e, "listening for a single shutdown signal");
            only.recv().await;
            tracing::info!("shutdown signal received");
        }
        (Err(e), Err(_)) => {
            tracing::warn!(error = %e, "unix signals unavailable, listening for ctrl_c");
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
            tracing::info!(signal = "ctrl_c", "shutdown signal received");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl_c unavailable, upload will not cancel on shutdown");
        std::future::pending::<()>().await;
    }
    tracing::info!(signal = "ctrl_c", "shutdown signal received");
}
