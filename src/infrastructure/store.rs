//! JSON file backed member store.
//!
//! The file holds a JSON array of members. It is read once on open and
//! rewritten atomically after every mutation. A mutation whose write fails
//! is undone in memory before the error is returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domain::{Member, NewMember};
use crate::infrastructure::error::{InfraError, InfraResult, RepositoryError, RepositoryResult};
use crate::infrastructure::error_ext::IoResultExt;
use crate::infrastructure::memory::InMemoryMemberRepository;
use crate::infrastructure::traits::{FileSystem, MemberRepository};

pub struct JsonMemberStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    members: InMemoryMemberRepository,
}

impl JsonMemberStore {
    /// Open the store at `path`; a missing file is an empty store.
    #[instrument(level = "debug", skip(fs))]
    pub fn open(fs: Arc<dyn FileSystem>, path: &Path) -> InfraResult<Self> {
        let members = if fs.exists(path) {
            let content = fs
                .read_to_string(path)
                .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str::<Vec<Member>>(&content).map_err(|e| InfraError::Store {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            }
        } else {
            Vec::new()
        };
        debug!("opened member store with {} members", members.len());
        let members =
            InMemoryMemberRepository::from_unique_members(members).map_err(|e| InfraError::Store {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(Self {
            fs,
            path: path.to_path_buf(),
            members,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> RepositoryResult<()> {
        let members = self.members.snapshot()?;
        let content = serde_json::to_string_pretty(&members).map_err(|e| {
            RepositoryError::unavailable(format!("serialize {}", self.path.display()), e)
        })?;
        self.fs
            .ensure_parent(&self.path)
            .with_path_context("create parent", &self.path)?;
        self.fs
            .write_atomic(&self.path, &content)
            .with_path_context("write", &self.path)?;
        debug!("persisted {} members to {}", members.len(), self.path.display());
        Ok(())
    }
}

impl MemberRepository for JsonMemberStore {
    fn create(&self, member: NewMember) -> RepositoryResult<Member> {
        let created = self.members.create(member)?;
        if let Err(e) = self.persist() {
            warn!("discarding {}: {}", created.public_id, e);
            self.members.remove(created.internal_id)?;
            return Err(e);
        }
        Ok(created)
    }

    fn find_by_public_id(&self, public_id: &str) -> RepositoryResult<Option<Member>> {
        self.members.find_by_public_id(public_id)
    }

    fn find_by_internal_id(&self, internal_id: u64) -> RepositoryResult<Option<Member>> {
        self.members.find_by_internal_id(internal_id)
    }

    fn find_last(&self) -> RepositoryResult<Option<Member>> {
        self.members.find_last()
    }

    fn find_all(&self) -> RepositoryResult<Vec<Member>> {
        self.members.find_all()
    }

    fn find_by_sponsor(
        &self,
        sponsor_public_id: &str,
        active_only: bool,
    ) -> RepositoryResult<Vec<Member>> {
        self.members.find_by_sponsor(sponsor_public_id, active_only)
    }

    fn find_by_sponsors(
        &self,
        sponsor_public_ids: &[String],
        active_only: bool,
    ) -> RepositoryResult<Vec<Member>> {
        self.members.find_by_sponsors(sponsor_public_ids, active_only)
    }

    fn exists_by_public_id(&self, public_id: &str) -> RepositoryResult<bool> {
        self.members.exists_by_public_id(public_id)
    }

    fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        self.members.exists_by_email(email)
    }

    fn exists_by_mobile(&self, mobile_number: &str) -> RepositoryResult<bool> {
        self.members.exists_by_mobile(mobile_number)
    }

    fn update(&self, member: &Member) -> RepositoryResult<()> {
        let previous = self
            .members
            .find_by_internal_id(member.internal_id)?
            .ok_or(RepositoryError::NotFound(member.internal_id))?;
        self.members.update(member)?;
        if let Err(e) = self.persist() {
            warn!("restoring {}: {}", previous.public_id, e);
            self.members.update(&previous)?;
            return Err(e);
        }
        Ok(())
    }
}
