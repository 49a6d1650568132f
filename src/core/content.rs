//! Lazy content providers for documents.

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

/// A lazy source of document content.
///
/// Providers are opened on demand; the engine never reads content unless a
/// module asks for it.
#[async_trait]
pub trait ContentProvider: Send + Sync + Debug {
    /// Reads the full content.
    async fn read(&self) -> std::io::Result<Vec<u8>>;

    /// A length hint, when cheaply known.
    fn len_hint(&self) -> Option<u64> {
        None
    }
}

/// Content backed by an in-memory string.
#[derive(Debug, Clone)]
pub struct StringContent {
    text: Arc<str>,
}

impl StringContent {
    /// Creates string-backed content.
    #[must_use]
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    /// The underlying text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[async_trait]
impl ContentProvider for StringContent {
    async fn read(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.text.as_bytes().to_vec())
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.text.len() as u64)
    }
}

/// Content backed by in-memory bytes.
#[derive(Debug, Clone)]
pub struct BytesContent {
    bytes: Arc<[u8]>,
}

impl BytesContent {
    /// Creates byte-backed content.
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl ContentProvider for BytesContent {
    async fn read(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.to_vec())
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }
}

/// Content read lazily from a file path.
#[derive(Debug, Clone)]
pub struct FileContent {
    path: PathBuf,
}

impl FileContent {
    /// Creates file-backed content.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ContentProvider for FileContent {
    async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}
