//! Infrastructure-level errors (wraps application errors)

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::application::ApplicationError;

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("member store {path}: {message}")]
    Store { path: PathBuf, message: String },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;

/// Member attribute guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Email,
    MobileNumber,
    PublicId,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentityField::Email => "email",
            IdentityField::MobileNumber => "mobile_number",
            IdentityField::PublicId => "public_id",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by a `MemberRepository`.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{field} already exists: {value}")]
    Conflict { field: IdentityField, value: String },

    #[error("no member with internal id {0}")]
    NotFound(u64),

    #[error("repository unavailable: {context}")]
    Unavailable {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RepositoryError {
    pub fn unavailable(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Unavailable {
            context: context.into(),
            source: source.into(),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
