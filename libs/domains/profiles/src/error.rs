use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(Uuid),

    #[error("Profile with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("VTID pool exhausted ({0}..={1})")]
    VtidPoolExhausted(i32, i32),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProfileResult<T> = Result<T, ProfileError>;
