//! In-memory implementation of the file system abstraction.

use super::FileSystem;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`FileSystem`] held entirely in memory.
///
/// The default file system for newly constructed engines; tests use it to
/// run pipelines without touching the disk.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    written: RwLock<Vec<PathBuf>>,
    temp_counter: AtomicUsize,
}

impl MemoryFileSystem {
    /// Creates an empty in-memory file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file without tracking it as written by the engine.
    pub fn seed(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.write().insert(path.into(), contents.into());
    }

    /// The number of stored files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    /// A snapshot of all stored paths.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.read().keys().cloned().collect()
    }
}

fn not_found(path: &Path) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("no such file: {}", path.display()),
    )
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    fn input_paths(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("input")]
    }

    fn output_path(&self) -> PathBuf {
        PathBuf::from("output")
    }

    fn temp_path(&self) -> PathBuf {
        PathBuf::from("temp")
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        self.files.write().insert(path.to_path_buf(), contents.to_vec());
        self.written.write().push(path.to_path_buf());
        Ok(())
    }

    async fn delete(&self, path: &Path) -> std::io::Result<()> {
        self.files.write().remove(path);
        Ok(())
    }

    async fn clean_output(&self) -> std::io::Result<()> {
        let root = self.output_path();
        self.files.write().retain(|path, _| !path.starts_with(&root));
        Ok(())
    }

    async fn clean_temp(&self) -> std::io::Result<()> {
        let root = self.temp_path();
        self.files.write().retain(|path, _| !path.starts_with(&root));
        Ok(())
    }

    async fn write_temp(&self, contents: &[u8]) -> std::io::Result<PathBuf> {
        let n = self.temp_counter.fetch_add(1, Ordering::SeqCst);
        let path = self.temp_path().join(format!("{n}.tmp"));
        self.files.write().insert(path.clone(), contents.to_vec());
        Ok(path)
    }

    fn written_files(&self) -> Vec<PathBuf> {
        self.written.read().clone()
    }

    fn clear_written_files(&self) {
        self.written.write().clear();
    }
}
