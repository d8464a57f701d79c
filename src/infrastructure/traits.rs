//! I/O boundary traits for testability
//!
//! These traits abstract storage and filesystem access, allowing services
//! to be tested with in-memory implementations.

use std::io::{self, Write};
use std::path::Path;

use crate::domain::{Member, NewMember};
use crate::infrastructure::error::RepositoryResult;

/// Storage of member records.
///
/// Ordered finders sort ascending by registration timestamp, ties broken by
/// internal id.
pub trait MemberRepository: Send + Sync {
    /// Persist a new member and assign its internal identity.
    ///
    /// Fails with `RepositoryError::Conflict` if email, mobile number or
    /// public id is already taken.
    fn create(&self, member: NewMember) -> RepositoryResult<Member>;

    fn find_by_public_id(&self, public_id: &str) -> RepositoryResult<Option<Member>>;

    fn find_by_internal_id(&self, internal_id: u64) -> RepositoryResult<Option<Member>>;

    /// Most recently created member (highest internal id).
    fn find_last(&self) -> RepositoryResult<Option<Member>>;

    fn find_all(&self) -> RepositoryResult<Vec<Member>>;

    /// Members whose sponsor is `sponsor_public_id`.
    fn find_by_sponsor(
        &self,
        sponsor_public_id: &str,
        active_only: bool,
    ) -> RepositoryResult<Vec<Member>>;

    /// Members whose sponsor is any of `sponsor_public_ids`, in one query.
    fn find_by_sponsors(
        &self,
        sponsor_public_ids: &[String],
        active_only: bool,
    ) -> RepositoryResult<Vec<Member>>;

    fn exists_by_public_id(&self, public_id: &str) -> RepositoryResult<bool>;

    fn exists_by_email(&self, email: &str) -> RepositoryResult<bool>;

    fn exists_by_mobile(&self, mobile_number: &str) -> RepositoryResult<bool>;

    /// Replace the stored record with the same internal id.
    fn update(&self, member: &Member) -> RepositoryResult<()>;
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace file content in one step (temp file + rename in the same directory).
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
