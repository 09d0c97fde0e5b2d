//! Local filesystem scheme handler

use super::traits::{
    APPLICATION_OCTET_STREAM, SchemeHandler, SourceHandle, SourceStream, last_path_segment,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Resolves `file://` URIs, `file:` paths and bare absolute paths
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSchemeHandler;

impl SchemeHandler for FileSchemeHandler {
    fn resolve(&self, identifier: &str) -> Result<Box<dyn SourceHandle>> {
        let path = file_path_of(identifier)?;
        Ok(Box::new(FileSource {
            identifier: identifier.to_string(),
            path,
        }))
    }
}

fn file_path_of(identifier: &str) -> Result<PathBuf> {
    if identifier
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("file://"))
    {
        let url = url::Url::parse(identifier)
            .map_err(|e| Error::config_key(format!("invalid file URI: {e}"), identifier))?;
        return url
            .to_file_path()
            .map_err(|()| Error::config_key("file URI has no local path", identifier));
    }
    let raw = match identifier.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("file:") => &identifier[5..],
        _ => identifier,
    };
    if raw.is_empty() {
        return Err(Error::config_key("empty file path", identifier));
    }
    Ok(PathBuf::from(raw))
}

/// A file on the local filesystem
#[derive(Debug)]
pub struct FileSource {
    identifier: String,
    path: PathBuf,
}

impl FileSource {
    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SourceHandle for FileSource {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn size(&self) -> u64 {
        match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cannot read file metadata, returning size 0"
                );
                0
            }
        }
    }

    async fn open_stream(&self) -> Result<SourceStream> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| Error::SourceUnavailable {
                identifier: self.identifier.clone(),
                reason: e.to_string(),
            })?;
        Ok(Box::new(file))
    }

    async fn content_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first_raw()
            .unwrap_or(APPLICATION_OCTET_STREAM)
            .to_string()
    }

    async fn display_name(&self) -> String {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => last_path_segment(&self.identifier).to_string(),
        }
    }

    async fn delete(&self) -> bool {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "file deletion error"
                );
                false
            }
        }
    }
}
