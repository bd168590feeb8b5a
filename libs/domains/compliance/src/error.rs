use domain_accounts::AccountError;
use domain_certifications::CertificationError;
use domain_notifications::NotificationError;
use domain_profiles::ProfileError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Certification(#[from] CertificationError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Profile not found: {0}")]
    ProfileNotFound(Uuid),

    #[error("Certification not found: {0}")]
    CertificationNotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),
}

pub type ComplianceResult<T> = Result<T, ComplianceError>;
