//! Local disk implementation of the file system abstraction.

use super::FileSystem;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A [`FileSystem`] backed by the local disk.
#[derive(Debug)]
pub struct LocalFileSystem {
    input_paths: Vec<PathBuf>,
    output_path: PathBuf,
    temp_path: PathBuf,
    written: Mutex<Vec<PathBuf>>,
}

impl LocalFileSystem {
    /// Creates a local file system rooted at the given directories.
    #[must_use]
    pub fn new(
        input_paths: Vec<PathBuf>,
        output_path: impl Into<PathBuf>,
        temp_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_paths,
            output_path: output_path.into(),
            temp_path: temp_path.into(),
            written: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    fn input_paths(&self) -> Vec<PathBuf> {
        self.input_paths.clone()
    }

    fn output_path(&self) -> PathBuf {
        self.output_path.clone()
    }

    fn temp_path(&self) -> PathBuf {
        self.temp_path.clone()
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
        self.written.lock().push(path.to_path_buf());
        Ok(())
    }

    async fn delete(&self, path: &Path) -> std::io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn clean_output(&self) -> std::io::Result<()> {
        remove_dir_contents(&self.output_path).await
    }

    async fn clean_temp(&self) -> std::io::Result<()> {
        remove_dir_contents(&self.temp_path).await
    }

    async fn write_temp(&self, contents: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.temp_path.join(format!("{}.tmp", Uuid::new_v4()));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }

    fn written_files(&self) -> Vec<PathBuf> {
        self.written.lock().clone()
    }

    fn clear_written_files(&self) {
        self.written.lock().clear();
    }
}

async fn remove_dir_contents(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tokio::fs::create_dir_all(dir).await
}
