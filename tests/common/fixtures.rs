//! Source fixtures: files on disk and an in-memory content provider

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;
use upload_service::ContentProvider;
use upload_service::error::Result;
use upload_service::schemes::{ColumnValue, QueryResult, Row, SourceStream, columns};

/// Write `contents` to `name` inside `dir` and return the full path
pub fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Deterministic payload of `len` bytes
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// One entry of a [`MemoryProvider`]
pub struct StoredContent {
    pub bytes: Vec<u8>,
    pub display_name: Option<String>,
    pub mime: Option<String>,
}

/// Content provider backed by a map of URIs
///
/// Entries added with [`MemoryProvider::insert_without_metadata`] open and
/// delete normally but have no metadata row, so their size reads as 0.
#[derive(Default)]
pub struct MemoryProvider {
    entries: Mutex<HashMap<String, StoredContent>>,
    unlisted: Mutex<HashSet<String>>,
}

impl MemoryProvider {
    pub fn insert(&self, uri: &str, content: StoredContent) {
        self.entries.lock().unwrap().insert(uri.to_string(), content);
    }

    pub fn insert_without_metadata(&self, uri: &str, bytes: Vec<u8>) {
        self.unlisted.lock().unwrap().insert(uri.to_string());
        self.insert(
            uri,
            StoredContent {
                bytes,
                display_name: None,
                mime: None,
            },
        );
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.entries.lock().unwrap().contains_key(uri)
    }
}

#[async_trait]
impl ContentProvider for MemoryProvider {
    async fn query(&self, uri: &str) -> Result<QueryResult> {
        if self.unlisted.lock().unwrap().contains(uri) {
            return Ok(QueryResult::NotFound);
        }
        let entries = self.entries.lock().unwrap();
        Ok(match entries.get(uri) {
            Some(content) => {
                let mut row = Row::new().with(
                    columns::SIZE,
                    ColumnValue::Integer(content.bytes.len() as i64),
                );
                if let Some(name) = &content.display_name {
                    row = row.with(columns::DISPLAY_NAME, ColumnValue::Text(name.clone()));
                }
                QueryResult::Found(row)
            }
            None => QueryResult::NotFound,
        })
    }

    async fn open_stream(&self, uri: &str) -> Result<Option<SourceStream>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(uri)
            .map(|content| Box::new(std::io::Cursor::new(content.bytes.clone())) as SourceStream))
    }

    async fn content_type(&self, uri: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries.get(uri).and_then(|content| content.mime.clone())
    }

    async fn delete(&self, uri: &str) -> Result<u64> {
        let removed = self.entries.lock().unwrap().remove(uri);
        Ok(u64::from(removed.is_some()))
    }
}
