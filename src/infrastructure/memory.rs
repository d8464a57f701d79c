//! In-memory member repository.

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, instrument};

use crate::domain::{Member, NewMember};
use crate::infrastructure::error::{IdentityField, RepositoryError, RepositoryResult};
use crate::infrastructure::traits::MemberRepository;

#[derive(Debug, Default)]
struct State {
    members: Vec<Member>,
    next_internal_id: u64,
}

/// Member repository backed by a vector under an `RwLock`.
///
/// Each call observes a consistent snapshot; nothing spans calls.
#[derive(Debug, Default)]
pub struct InMemoryMemberRepository {
    state: RwLock<State>,
}

impl InMemoryMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with already persisted members.
    pub fn from_members(members: Vec<Member>) -> Self {
        let next_internal_id = members.iter().map(|m| m.internal_id).max().unwrap_or(0) + 1;
        Self {
            state: RwLock::new(State {
                members,
                next_internal_id,
            }),
        }
    }

    /// Seed from persisted members, rejecting records that share a public
    /// id, email or mobile number.
    pub fn from_unique_members(members: Vec<Member>) -> RepositoryResult<Self> {
        match first_duplicate(&members) {
            Some(conflict) => Err(conflict),
            None => Ok(Self::from_members(members)),
        }
    }

    /// Drop the record with `internal_id`, releasing its id if it was the
    /// last one handed out.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&self, internal_id: u64) -> RepositoryResult<Option<Member>> {
        let mut state = self.write()?;
        let Some(pos) = state
            .members
            .iter()
            .position(|m| m.internal_id == internal_id)
        else {
            return Ok(None);
        };
        let removed = state.members.remove(pos);
        if state.next_internal_id == internal_id + 1 {
            state.next_internal_id = internal_id;
        }
        debug!("removed {}", removed.public_id);
        Ok(Some(removed))
    }

    /// Copy of all records in insertion order.
    pub fn snapshot(&self) -> RepositoryResult<Vec<Member>> {
        Ok(self.read()?.members.clone())
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| RepositoryError::unavailable("member lock poisoned", e.to_string()))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| RepositoryError::unavailable("member lock poisoned", e.to_string()))
    }

    fn conflict_with(state: &State, member: &NewMember) -> Option<RepositoryError> {
        let (field, value) = state.members.iter().find_map(|m| {
            if m.public_id == member.public_id {
                Some((IdentityField::PublicId, &member.public_id))
            } else if m.email == member.email {
                Some((IdentityField::Email, &member.email))
            } else if m.mobile_number == member.mobile_number {
                Some((IdentityField::MobileNumber, &member.mobile_number))
            } else {
                None
            }
        })?;
        Some(RepositoryError::Conflict {
            field,
            value: value.clone(),
        })
    }
}

fn first_duplicate(members: &[Member]) -> Option<RepositoryError> {
    let mut public_ids = HashSet::new();
    let mut emails = HashSet::new();
    let mut mobiles = HashSet::new();
    members.iter().find_map(|m| {
        let (field, value) = if !public_ids.insert(m.public_id.as_str()) {
            (IdentityField::PublicId, &m.public_id)
        } else if !emails.insert(m.email.as_str()) {
            (IdentityField::Email, &m.email)
        } else if !mobiles.insert(m.mobile_number.as_str()) {
            (IdentityField::MobileNumber, &m.mobile_number)
        } else {
            return None;
        };
        Some(RepositoryError::Conflict {
            field,
            value: value.clone(),
        })
    })
}

fn sorted_by_registration(mut members: Vec<Member>) -> Vec<Member> {
    members.sort_by(|a, b| {
        a.registered_at
            .cmp(&b.registered_at)
            .then(a.internal_id.cmp(&b.internal_id))
    });
    members
}

impl MemberRepository for InMemoryMemberRepository {
    #[instrument(level = "debug", skip(self, member), fields(public_id = %member.public_id))]
    fn create(&self, member: NewMember) -> RepositoryResult<Member> {
        let mut state = self.write()?;
        if let Some(conflict) = Self::conflict_with(&state, &member) {
            debug!("create rejected: {}", conflict);
            return Err(conflict);
        }
        let internal_id = state.next_internal_id.max(1);
        state.next_internal_id = internal_id + 1;
        let created = member.into_member(internal_id);
        state.members.push(created.clone());
        Ok(created)
    }

    fn find_by_public_id(&self, public_id: &str) -> RepositoryResult<Option<Member>> {
        Ok(self
            .read()?
            .members
            .iter()
            .find(|m| m.public_id == public_id)
            .cloned())
    }

    fn find_by_internal_id(&self, internal_id: u64) -> RepositoryResult<Option<Member>> {
        Ok(self
            .read()?
            .members
            .iter()
            .find(|m| m.internal_id == internal_id)
            .cloned())
    }

    fn find_last(&self) -> RepositoryResult<Option<Member>> {
        Ok(self
            .read()?
            .members
            .iter()
            .max_by_key(|m| m.internal_id)
            .cloned())
    }

    fn find_all(&self) -> RepositoryResult<Vec<Member>> {
        Ok(sorted_by_registration(self.read()?.members.clone()))
    }

    fn find_by_sponsor(
        &self,
        sponsor_public_id: &str,
        active_only: bool,
    ) -> RepositoryResult<Vec<Member>> {
        let state = self.read()?;
        let found = state
            .members
            .iter()
            .filter(|m| m.is_sponsored_by(sponsor_public_id) && (m.is_active || !active_only))
            .cloned()
            .collect();
        Ok(sorted_by_registration(found))
    }

    fn find_by_sponsors(
        &self,
        sponsor_public_ids: &[String],
        active_only: bool,
    ) -> RepositoryResult<Vec<Member>> {
        if sponsor_public_ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<&str> = sponsor_public_ids.iter().map(String::as_str).collect();
        let state = self.read()?;
        let found = state
            .members
            .iter()
            .filter(|m| {
                m.sponsor_public_id
                    .as_deref()
                    .is_some_and(|s| wanted.contains(s))
                    && (m.is_active || !active_only)
            })
            .cloned()
            .collect();
        Ok(sorted_by_registration(found))
    }

    fn exists_by_public_id(&self, public_id: &str) -> RepositoryResult<bool> {
        Ok(self.read()?.members.iter().any(|m| m.public_id == public_id))
    }

    fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        Ok(self.read()?.members.iter().any(|m| m.email == email))
    }

    fn exists_by_mobile(&self, mobile_number: &str) -> RepositoryResult<bool> {
        Ok(self
            .read()?
            .members
            .iter()
            .any(|m| m.mobile_number == mobile_number))
    }

    #[instrument(level = "debug", skip(self, member), fields(public_id = %member.public_id))]
    fn update(&self, member: &Member) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let slot = state
            .members
            .iter_mut()
            .find(|m| m.internal_id == member.internal_id)
            .ok_or(RepositoryError::NotFound(member.internal_id))?;
        *slot = member.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn new_member(public_id: &str, sponsor: Option<&str>, minute: u32) -> NewMember {
        NewMember {
            public_id: public_id.to_string(),
            full_name: format!("Member {public_id}"),
            email: format!("{public_id}@example.com"),
            mobile_number: format!("90000{public_id}"),
            password_hash: String::new(),
            sponsor_public_id: sponsor.map(str::to_string),
            is_active: true,
            is_admin: false,
            registered_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
        }
    }

    #[test]
    fn given_new_members_when_created_then_internal_ids_increase() {
        let repo = InMemoryMemberRepository::new();
        let a = repo.create(new_member("REG1", None, 0)).unwrap();
        let b = repo.create(new_member("REG2", Some("REG1"), 1)).unwrap();
        assert_eq!(a.internal_id, 1);
        assert_eq!(b.internal_id, 2);
        assert_eq!(repo.find_last().unwrap().unwrap().public_id, "REG2");
    }

    #[test]
    fn given_duplicate_email_when_created_then_conflict() {
        let repo = InMemoryMemberRepository::new();
        repo.create(new_member("REG1", None, 0)).unwrap();
        let mut dup = new_member("REG2", None, 1);
        dup.email = "REG1@example.com".to_string();
        match repo.create(dup) {
            Err(RepositoryError::Conflict { field, .. }) => {
                assert_eq!(field, IdentityField::Email)
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn given_seeded_members_when_creating_then_continues_after_max_id() {
        let seeded = new_member("REG7", None, 0).into_member(7);
        let repo = InMemoryMemberRepository::from_members(vec![seeded]);
        let created = repo.create(new_member("REG8", Some("REG7"), 1)).unwrap();
        assert_eq!(created.internal_id, 8);
    }

    #[test]
    fn given_children_registered_out_of_order_when_find_by_sponsor_then_sorted() {
        let repo = InMemoryMemberRepository::new();
        repo.create(new_member("REG1", None, 0)).unwrap();
        repo.create(new_member("REG3", Some("REG1"), 9)).unwrap();
        repo.create(new_member("REG2", Some("REG1"), 5)).unwrap();
        let ids: Vec<_> = repo
            .find_by_sponsor("REG1", true)
            .unwrap()
            .into_iter()
            .map(|m| m.public_id)
            .collect();
        assert_eq!(ids, vec!["REG2", "REG3"]);
    }

    #[test]
    fn given_members_sharing_mobile_when_from_unique_members_then_conflict() {
        let a = new_member("REG1", None, 0).into_member(1);
        let mut b = new_member("REG2", None, 1).into_member(2);
        b.mobile_number = a.mobile_number.clone();
        match InMemoryMemberRepository::from_unique_members(vec![a, b]) {
            Err(RepositoryError::Conflict { field, value }) => {
                assert_eq!(field, IdentityField::MobileNumber);
                assert_eq!(value, "90000REG1");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn given_last_created_when_removed_then_id_reused_and_record_gone() {
        let repo = InMemoryMemberRepository::new();
        repo.create(new_member("REG1", None, 0)).unwrap();
        let second = repo.create(new_member("REG2", Some("REG1"), 1)).unwrap();

        let removed = repo.remove(second.internal_id).unwrap();

        assert_eq!(removed.map(|m| m.public_id).as_deref(), Some("REG2"));
        assert!(!repo.exists_by_email("REG2@example.com").unwrap());
        assert!(repo.remove(second.internal_id).unwrap().is_none());
        let again = repo.create(new_member("REG2", Some("REG1"), 2)).unwrap();
        assert_eq!(again.internal_id, second.internal_id);
    }

    #[test]
    fn given_unknown_internal_id_when_update_then_not_found() {
        let repo = InMemoryMemberRepository::new();
        let ghost = new_member("REG1", None, 0).into_member(42);
        assert!(matches!(repo.update(&ghost), Err(RepositoryError::NotFound(42))));
    }
}
