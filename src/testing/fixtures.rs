//! Temporary files and in-memory streams for tests.

use anyhow::{Context, Result};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is removed when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A path inside this directory; nothing is created.
    #[must_use]
    pub fn file_path(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }
}

impl Default for TempDirPath {
    fn default() -> Self {
        Self::new().expect("Failed to create temporary directory")
    }
}

/// Create files below `root`, making parent directories as needed.
///
/// Each entry is `(relative path, contents)`; `/` separates path components.
///
/// # Errors
///
/// Returns the first directory or file that could not be written.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> Result<()> {
    for (relative, contents) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

/// One in-memory readable stream per text, in order.
#[must_use]
pub fn text_streams(texts: &[&str]) -> Vec<Cursor<Vec<u8>>> {
    texts
        .iter()
        .map(|t| Cursor::new(t.as_bytes().to_vec()))
        .collect()
}
