//! Error types for the notifications domain.

use thiserror::Error;
use uuid::Uuid;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur in the notifications domain.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Notification record not found.
    #[error("Notification not found: {0}")]
    NotFound(Uuid),

    /// Delivery gateway error (transport construction, bad address).
    #[error("Delivery gateway error: {0}")]
    GatewayError(String),

    /// Template rendering error.
    #[error("Template rendering error: {0}")]
    TemplateError(String),

    /// Database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for NotificationError {
    fn from(err: sea_orm::DbErr) -> Self {
        NotificationError::DatabaseError(err.to_string())
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::TemplateError(err.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::Internal(format!("JSON serialization error: {}", err))
    }
}
