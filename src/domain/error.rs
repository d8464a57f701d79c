//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business rule violations.
/// These are independent of storage concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("member not found: {0}")]
    MemberNotFound(String),

    #[error("invalid sponsor id: {0}")]
    InvalidSponsor(String),

    #[error("{field} already registered: {value}")]
    DuplicateIdentity { field: String, value: String },

    #[error("sponsor link {member} -> {sponsor} would create a cycle")]
    CycleDetected { member: String, sponsor: String },

    #[error("invalid public id: {0}")]
    InvalidPublicId(String),
}
