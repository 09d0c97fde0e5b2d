//! Upload execution
//!
//! Split into focused submodules:
//! - [`executor`] - one attempt: headers, body length, transport call, completion rule
//! - [`body`] - the upload body capability set and the raw multi-source body
//! - [`headers`] - User-Agent/Content-Type injection and header validation
//! - [`state`] - per-attempt counters and the shared cancellation flag
//! - [`task`] - retries around fresh executors and task lifecycle events

mod body;
mod executor;
pub mod headers;
mod state;
mod task;


pub use body::{RawBody, UploadBody};
pub use executor::HttpUploadTask;
pub use state::{CancelHandle, UploadState};
pub use task::UploadTask;
