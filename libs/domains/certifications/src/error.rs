use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CertificationError {
    #[error("Certification not found: {0}")]
    NotFound(Uuid),

    #[error("Expiry date {expiry} must be strictly after issue date {issue}")]
    InvalidDates { issue: NaiveDate, expiry: NaiveDate },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CertificationResult<T> = Result<T, CertificationError>;
