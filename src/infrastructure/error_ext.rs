//! Error conversion helpers for file I/O behind the repository boundary.

use std::io;
use std::path::Path;

use crate::infrastructure::error::{RepositoryError, RepositoryResult};

/// Extension trait for converting `io::Result` to `RepositoryResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.write_atomic(&path, &content)
    ///     .with_path_context("write", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> RepositoryResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> RepositoryResult<T> {
        self.map_err(|e| RepositoryError::unavailable(format!("{}: {}", action, path.display()), e))
    }
}
