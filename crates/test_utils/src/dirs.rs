//! Scratch directories for test databases

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

enum Root {
    Temporary(TempDir),
    Fixed(PathBuf),
}

/// Directory that holds the working and pristine database files
///
/// A temporary root is removed when the `TestDirs` is dropped; a fixed root
/// is left in place.
pub struct TestDirs {
    root: Root,
}

impl TestDirs {
    /// Creates a fresh temporary root, private to this process
    pub fn temporary() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("identity-tests-").tempdir()?;
        debug!(path = %dir.path().display(), "Created temporary test directory");
        Ok(Self {
            root: Root::Temporary(dir),
        })
    }

    /// Uses `path` as the root, creating it if needed
    pub fn at(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        std::fs::create_dir_all(&path)?;
        Ok(Self {
            root: Root::Fixed(path),
        })
    }

    pub fn root(&self) -> &Path {
        match &self.root {
            Root::Temporary(dir) => dir.path(),
            Root::Fixed(path) => path,
        }
    }

    /// Path of a file inside the root
    pub fn tmp(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root().join(name)
    }
}

impl std::fmt::Debug for TestDirs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDirs").field("root", &self.root()).finish()
    }
}
