//! Registration service
//!
//! Allocates public ids, validates sponsors and creates members. Also hosts
//! the maintenance operations that mutate existing members.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::ApplicationResult;
use crate::domain::{normalize_sponsor, DomainError, Member, NewMember, PublicIdScheme, Registration};
use crate::infrastructure::traits::MemberRepository;
use crate::infrastructure::{IdentityField, RepositoryError};

/// Salted SHA-256 digest, stored as `<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

/// Check `password` against a value produced by `hash_password`.
#[cfg(test)]
fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct RegistrationService {
    repo: Arc<dyn MemberRepository>,
    scheme: PublicIdScheme,
    max_attempts: u32,
}

impl RegistrationService {
    pub fn new(repo: Arc<dyn MemberRepository>, scheme: PublicIdScheme, max_attempts: u32) -> Self {
        Self {
            repo,
            scheme,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Next public id: continues the sequence of the most recently created
    /// member, or starts at the first sequence.
    ///
    /// Not safe against concurrent registrations on its own; `register`
    /// relies on the repository's uniqueness check and retries.
    #[instrument(level = "debug", skip(self))]
    pub fn allocate_next_public_id(&self) -> ApplicationResult<String> {
        let last = self.repo.find_last()?;
        let next = self
            .scheme
            .next_after(last.as_ref().map(|m| m.public_id.as_str()));
        debug!("allocate_next_public_id: {}", next);
        Ok(next)
    }

    /// Absent or blank sponsors are valid; otherwise the sponsor must exist
    /// and be active.
    pub fn is_valid_sponsor(&self, sponsor_public_id: Option<&str>) -> ApplicationResult<bool> {
        let Some(sponsor) = normalize_sponsor(sponsor_public_id) else {
            return Ok(true);
        };
        Ok(self
            .repo
            .find_by_public_id(sponsor)?
            .is_some_and(|m| m.is_active))
    }

    /// Register a new active, non-admin member.
    #[instrument(level = "debug", skip(self, registration), fields(email = %registration.email))]
    pub fn register(&self, registration: Registration) -> ApplicationResult<Member> {
        if self.repo.exists_by_email(&registration.email)? {
            return Err(duplicate(IdentityField::Email, &registration.email));
        }
        if self.repo.exists_by_mobile(&registration.mobile_number)? {
            return Err(duplicate(
                IdentityField::MobileNumber,
                &registration.mobile_number,
            ));
        }

        let sponsor = normalize_sponsor(registration.sponsor_public_id.as_deref()).map(str::to_string);
        if let Some(sponsor_id) = &sponsor {
            if !self.is_valid_sponsor(Some(sponsor_id))? {
                return Err(DomainError::InvalidSponsor(sponsor_id.clone()).into());
            }
        }

        let password_hash = hash_password(&registration.password);
        let mut public_id = self.allocate_next_public_id()?;
        let mut taken = public_id.clone();

        for attempt in 1..=self.max_attempts {
            let candidate = NewMember {
                public_id: public_id.clone(),
                full_name: registration.full_name.clone(),
                email: registration.email.clone(),
                mobile_number: registration.mobile_number.clone(),
                password_hash: password_hash.clone(),
                sponsor_public_id: sponsor.clone(),
                is_active: true,
                is_admin: false,
                registered_at: Utc::now(),
            };

            match self.repo.create(candidate) {
                Ok(member) => {
                    info!(
                        "registered {} (sponsor: {})",
                        member.public_id,
                        member.sponsor_public_id.as_deref().unwrap_or("none")
                    );
                    return Ok(member);
                }
                Err(RepositoryError::Conflict {
                    field: IdentityField::PublicId,
                    value,
                }) => {
                    warn!("attempt {}: public id {} already taken", attempt, value);
                    public_id = self.scheme.next_after(Some(&value));
                    taken = value;
                }
                Err(RepositoryError::Conflict { field, value }) => {
                    return Err(duplicate(field, &value));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(duplicate(IdentityField::PublicId, &taken))
    }

    /// Activate or deactivate a member. Returns false for unknown members.
    #[instrument(level = "debug", skip(self))]
    pub fn update_status(&self, internal_id: u64, is_active: bool) -> ApplicationResult<bool> {
        let Some(mut member) = self.repo.find_by_internal_id(internal_id)? else {
            return Ok(false);
        };
        member.is_active = is_active;
        self.repo.update(&member)?;
        info!(
            "{} is now {}",
            member.public_id,
            if is_active { "active" } else { "inactive" }
        );
        Ok(true)
    }

    /// Set or clear the sponsor of an existing member.
    ///
    /// The new sponsor must be valid and must not be the member itself or
    /// any of its descendants.
    #[instrument(level = "debug", skip(self))]
    pub fn assign_sponsor(
        &self,
        public_id: &str,
        sponsor_public_id: Option<&str>,
    ) -> ApplicationResult<Member> {
        let mut member = self
            .repo
            .find_by_public_id(public_id)?
            .ok_or_else(|| DomainError::MemberNotFound(public_id.to_string()))?;
        let sponsor = normalize_sponsor(sponsor_public_id);

        if let Some(sponsor_id) = sponsor {
            if !self.is_valid_sponsor(Some(sponsor_id))? {
                return Err(DomainError::InvalidSponsor(sponsor_id.to_string()).into());
            }
            if self.chain_reaches(sponsor_id, &member.public_id)? {
                return Err(DomainError::CycleDetected {
                    member: member.public_id.clone(),
                    sponsor: sponsor_id.to_string(),
                }
                .into());
            }
        }

        member.sponsor_public_id = sponsor.map(str::to_string);
        self.repo.update(&member)?;
        info!(
            "sponsor of {} set to {}",
            member.public_id,
            sponsor.unwrap_or("none")
        );
        Ok(member)
    }

    /// True if walking sponsor links up from `start` reaches `target`
    /// (`start` itself included).
    fn chain_reaches(&self, start: &str, target: &str) -> ApplicationResult<bool> {
        let mut seen = HashSet::new();
        let mut current = Some(start.to_string());
        while let Some(id) = current {
            if id == target {
                return Ok(true);
            }
            if !seen.insert(id.clone()) {
                warn!("existing sponsor cycle through {}", id);
                return Ok(false);
            }
            current = self
                .repo
                .find_by_public_id(&id)?
                .and_then(|m| m.sponsor_public_id);
        }
        Ok(false)
    }
}

fn duplicate(field: IdentityField, value: &str) -> crate::application::ApplicationError {
    DomainError::DuplicateIdentity {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}
