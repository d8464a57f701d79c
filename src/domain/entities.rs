//! Domain entities: core data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A participant node in the referral graph.
///
/// The tree is encoded solely through `sponsor_public_id`; no child list is
/// kept anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Storage identity, assigned by the repository, never shown to members
    pub internal_id: u64,
    /// Human-facing identifier, e.g. "REG1001"
    pub public_id: String,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    /// Opaque credential digest (see `RegistrationService`)
    pub password_hash: String,
    /// Public id of the member who referred this one, None for roots
    #[serde(default)]
    pub sponsor_public_id: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    /// Orders sibling referral lists (ascending)
    pub registered_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Member {
    /// True if `sponsor` is this member's direct sponsor.
    pub fn is_sponsored_by(&self, sponsor: &str) -> bool {
        self.sponsor_public_id.as_deref() == Some(sponsor)
    }
}

/// Member record before the repository assigned an internal identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub public_id: String,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub password_hash: String,
    pub sponsor_public_id: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub registered_at: DateTime<Utc>,
}

impl NewMember {
    /// Attach the storage identity chosen by the repository.
    pub fn into_member(self, internal_id: u64) -> Member {
        Member {
            internal_id,
            public_id: self.public_id,
            full_name: self.full_name,
            email: self.email,
            mobile_number: self.mobile_number,
            password_hash: self.password_hash,
            sponsor_public_id: self.sponsor_public_id,
            is_active: self.is_active,
            is_admin: self.is_admin,
            registered_at: self.registered_at,
        }
    }
}

/// Input for registering a new member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub password: String,
    pub sponsor_public_id: Option<String>,
}

/// Normalize an optional sponsor reference: blank means "no sponsor".
pub fn normalize_sponsor(sponsor: Option<&str>) -> Option<&str> {
    sponsor.map(str::trim).filter(|s| !s.is_empty())
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
