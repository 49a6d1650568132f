//! Immutable document values.

use super::ContentProvider;
use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// An immutable document flowing through a pipeline.
///
/// Documents are produced by one module and consumed by the next; they are
/// never mutated in place. The `with_*` methods derive a modified copy that
/// keeps the original identity; [`Document::new`] mints a fresh identity.
/// Identity (the id) is used for caching and logging only; content equality
/// is not defined.
#[derive(Clone)]
pub struct Document {
    id: Uuid,
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    metadata: IndexMap<String, serde_json::Value>,
    content: Option<Arc<dyn ContentProvider>>,
}

impl Document {
    /// Creates an empty document with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            source: None,
            destination: None,
            metadata: IndexMap::new(),
            content: None,
        }
    }

    /// Sets the source path.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the destination path.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Adds a metadata entry, preserving insertion order.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Sets the content provider.
    #[must_use]
    pub fn with_content(mut self, content: Arc<dyn ContentProvider>) -> Self {
        self.content = Some(content);
        self
    }

    /// The document's identity.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The source path, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The destination path, if any.
    #[must_use]
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// The ordered metadata map.
    #[must_use]
    pub fn metadata(&self) -> &IndexMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Looks up a metadata value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// The content provider, if any.
    #[must_use]
    pub fn content(&self) -> Option<&Arc<dyn ContentProvider>> {
        self.content.as_ref()
    }

    /// Whether two documents share the same identity.
    #[must_use]
    pub fn same_identity(&self, other: &Document) -> bool {
        self.id == other.id
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("metadata", &self.metadata)
            .field("has_content", &self.content.is_some())
            .finish()
    }
}
