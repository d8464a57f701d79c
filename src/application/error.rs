//! Application-level errors (wraps domain and repository errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::RepositoryError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Repository(#[from] RepositoryError),

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
