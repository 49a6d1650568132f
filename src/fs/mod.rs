//! File system abstraction consumed by the engine.
//!
//! The engine never touches the disk directly: clean modes, temp spill
//! files, and module writes all go through [`FileSystem`]. The crate ships
//! a real [`LocalFileSystem`] and an in-memory [`MemoryFileSystem`] used
//! as the default for tests and dry runs.

mod local;
mod memory;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// The engine's view of the file system.
///
/// Implementations track the files written through [`FileSystem::write`]
/// so the `Self` clean mode and disposal can delete exactly what the
/// engine produced.
#[async_trait]
pub trait FileSystem: Send + Sync + Debug {
    /// Directories scanned for input documents.
    fn input_paths(&self) -> Vec<PathBuf>;

    /// The output directory root.
    fn output_path(&self) -> PathBuf;

    /// The temp directory root.
    fn temp_path(&self) -> PathBuf;

    /// Reads a file.
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    /// Writes a file, creating parent directories, and tracks it as
    /// written by this engine.
    async fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()>;

    /// Deletes a file. Missing files are not an error.
    async fn delete(&self, path: &Path) -> std::io::Result<()>;

    /// Removes everything under the output directory.
    async fn clean_output(&self) -> std::io::Result<()>;

    /// Removes everything under the temp directory.
    async fn clean_temp(&self) -> std::io::Result<()>;

    /// Writes `contents` to a fresh file under the temp directory and
    /// returns its path.
    async fn write_temp(&self, contents: &[u8]) -> std::io::Result<PathBuf>;

    /// The files written through this file system, in write order.
    fn written_files(&self) -> Vec<PathBuf>;

    /// Forgets the written-files set without deleting anything.
    fn clear_written_files(&self);
}
