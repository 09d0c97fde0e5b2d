//! HTTP transport abstraction
//!
//! The upload core talks to the network only through [`HttpStack`] and
//! [`HttpRequest`]. During [`HttpRequest::get_response`] the transport calls
//! back into the core twice over:
//!
//! - [`RequestBodyDelegate`] supplies the body by writing into a [`BodyWriter`]
//! - [`StreamWriteListener`] is polled before each chunk and notified after it
//!
//! [`ReqwestStack`] is the reference implementation.

mod body_writer;
mod reqwest_stack;
mod traits;

pub use body_writer::{BodyWriter, DEFAULT_BUFFER_SIZE};
pub use reqwest_stack::ReqwestStack;
pub use traits::{HttpRequest, HttpStack, RequestBodyDelegate, StreamWriteListener};
