//! Source resolution
//!
//! A source identifier is an opaque string tagged with a scheme
//! (`content://...`, `file:///...`, or a bare absolute path). The
//! [`SchemeHandlerRegistry`] picks the [`SchemeHandler`] registered for that
//! scheme, which turns the identifier into a [`SourceHandle`]: size, content
//! type, display name, a readable stream and a best-effort delete.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use upload_service::schemes::{ContentProvider, ContentSchemeHandler, SchemeHandlerRegistry};
//!
//! # async fn example(provider: Arc<dyn ContentProvider>) -> upload_service::Result<()> {
//! let mut registry = SchemeHandlerRegistry::with_defaults();
//! registry.register("content", ContentSchemeHandler::new(provider));
//!
//! let handle = registry.resolve("content://media/external/images/42")?;
//! println!("{} ({} bytes)", handle.display_name().await, handle.size().await);
//! # Ok(())
//! # }
//! ```

mod content;
mod file;
mod registry;
mod traits;

pub use content::{
    CONTENT_SCHEME, ColumnValue, ContentProvider, ContentSchemeHandler, ContentSource,
    QueryResult, Row, columns,
};
pub use file::{FileSchemeHandler, FileSource};
pub use registry::{FILE_SCHEME, SchemeHandlerRegistry, scheme_of};
pub use traits::{
    APPLICATION_OCTET_STREAM, SchemeHandler, SourceHandle, SourceStream, last_path_segment,
};
