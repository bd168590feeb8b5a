use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Account not found: {0}")]
    NotFound(Uuid),

    #[error("Account with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Account with username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AccountResult<T> = Result<T, AccountError>;
