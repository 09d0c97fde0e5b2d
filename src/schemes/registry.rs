//! Scheme handler registry

use super::file::FileSchemeHandler;
use super::traits::{SchemeHandler, SourceHandle};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Scheme used for bare absolute paths
pub const FILE_SCHEME: &str = "file";

/// Maps scheme tokens to [`SchemeHandler`]s
///
/// Registration takes `&mut self` and resolution `&self`, so a registry
/// populated at startup and then shared behind an `Arc` cannot be mutated
/// while uploads resolve sources through it.
///
/// # Examples
///
/// ```
/// use upload_service::schemes::SchemeHandlerRegistry;
///
/// let registry = SchemeHandlerRegistry::with_defaults();
/// assert!(registry.is_supported("/tmp/photo.jpg"));
/// assert!(registry.is_supported("file:///tmp/photo.jpg"));
/// assert!(!registry.is_supported("content://media/external/images/42"));
/// ```
#[derive(Clone, Default)]
pub struct SchemeHandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn SchemeHandler>>,
}

impl SchemeHandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the local file handler registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FILE_SCHEME, FileSchemeHandler);
        registry
    }

    /// Register a handler for a scheme, replacing any previous one
    ///
    /// The scheme is matched case-insensitively; `"content"`, `"content:"`
    /// and `"content://"` all register the same token.
    pub fn register(
        &mut self,
        scheme: &str,
        handler: impl SchemeHandler + 'static,
    ) -> &mut Self {
        self.register_arc(scheme, Arc::new(handler))
    }

    /// Register an already shared handler
    pub fn register_arc(&mut self, scheme: &str, handler: Arc<dyn SchemeHandler>) -> &mut Self {
        let token = normalize_scheme(scheme);
        if self.handlers.insert(token.clone(), handler).is_some() {
            tracing::debug!(scheme = %token, "replaced scheme handler");
        }
        self
    }

    /// Registered scheme tokens, sorted
    pub fn schemes(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Whether a handler exists for the identifier's scheme
    pub fn is_supported(&self, identifier: &str) -> bool {
        scheme_of(identifier).is_some_and(|scheme| self.handlers.contains_key(&scheme))
    }

    /// Resolve an identifier into a fresh [`SourceHandle`]
    ///
    /// Fails with [`Error::UnsupportedScheme`] when no handler is registered
    /// for the identifier's scheme.
    pub fn resolve(&self, identifier: &str) -> Result<Box<dyn SourceHandle>> {
        let handler = scheme_of(identifier)
            .and_then(|scheme| self.handlers.get(&scheme))
            .ok_or_else(|| Error::UnsupportedScheme {
                identifier: identifier.to_string(),
                supported: self.schemes(),
            })?;
        handler.resolve(identifier)
    }
}

impl std::fmt::Debug for SchemeHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemeHandlerRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

/// Extract the lowercased scheme token of an identifier
///
/// Identifiers starting with `/` are local paths and map to [`FILE_SCHEME`].
/// Otherwise the scheme is everything before the first `:`, which must start
/// with a letter and contain only letters, digits, `+`, `-` and `.`.
pub fn scheme_of(identifier: &str) -> Option<String> {
    if identifier.starts_with('/') {
        return Some(FILE_SCHEME.to_string());
    }

    let (scheme, _) = identifier.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

fn normalize_scheme(scheme: &str) -> String {
    scheme
        .trim()
        .trim_end_matches('/')
        .trim_end_matches(':')
        .to_ascii_lowercase()
}
