//! Data models for the notifications domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened; drives recipients, message text and priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An employee profile was created.
    ProfileCreated,
    /// An employee profile was edited.
    ProfileUpdated,
    /// An employee profile (and its certifications) was removed.
    ProfileDeleted,
    /// A certification was added.
    CertificationCreated,
    /// A certification was edited.
    CertificationUpdated,
    /// A certification was removed.
    CertificationDeleted,
    /// A certification hits an approaching-expiry threshold.
    ExpiryApproaching,
    /// A certification has passed its expiry date.
    Expired,
    /// A login account was synthesized; carries the one-time credential
    /// to the delivery channel only.
    CredentialsIssued,
    /// Anything that has no dedicated kind.
    General,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::ProfileCreated => "profile_created",
            NotificationKind::ProfileUpdated => "profile_updated",
            NotificationKind::ProfileDeleted => "profile_deleted",
            NotificationKind::CertificationCreated => "certification_created",
            NotificationKind::CertificationUpdated => "certification_updated",
            NotificationKind::CertificationDeleted => "certification_deleted",
            NotificationKind::ExpiryApproaching => "expiry_approaching",
            NotificationKind::Expired => "expired",
            NotificationKind::CredentialsIssued => "credentials_issued",
            NotificationKind::General => "general",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile_created" => Ok(NotificationKind::ProfileCreated),
            "profile_updated" => Ok(NotificationKind::ProfileUpdated),
            "profile_deleted" => Ok(NotificationKind::ProfileDeleted),
            "certification_created" => Ok(NotificationKind::CertificationCreated),
            "certification_updated" => Ok(NotificationKind::CertificationUpdated),
            "certification_deleted" => Ok(NotificationKind::CertificationDeleted),
            "expiry_approaching" => Ok(NotificationKind::ExpiryApproaching),
            "expired" => Ok(NotificationKind::Expired),
            "credentials_issued" => Ok(NotificationKind::CredentialsIssued),
            "general" => Ok(NotificationKind::General),
            _ => Err(format!("Unknown notification kind: {}", s)),
        }
    }
}

/// Display priority of an in-app notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl NotificationKind {
    /// Default priority for this kind; reminders sharpen as the date nears.
    pub fn priority(&self, days_value: Option<i64>) -> Priority {
        match self {
            NotificationKind::Expired => Priority::Urgent,
            NotificationKind::ExpiryApproaching => match days_value {
                Some(days) if days <= 7 => Priority::High,
                _ => Priority::Normal,
            },
            NotificationKind::CredentialsIssued => Priority::High,
            NotificationKind::ProfileDeleted => Priority::High,
            _ => Priority::Normal,
        }
    }
}

/// An in-app notification record.
///
/// Immutable after creation except for the read flag and its timestamp;
/// never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// Recipient account.
    pub account_id: Uuid,
    pub kind: NotificationKind,
    pub priority: Priority,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    /// Free-form event context (never contains secrets).
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        account_id: Uuid,
        kind: NotificationKind,
        priority: Priority,
        message: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id,
            kind,
            priority,
            message,
            is_read: false,
            read_at: None,
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// Query filters for listing a recipient's notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationFilter {
    pub kind: Option<NotificationKind>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for NotificationFilter {
    fn default() -> Self {
        Self {
            kind: None,
            unread_only: false,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// A domain event handed to the fan-out engine.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    /// The employee the event is about.
    pub subject_profile_id: Uuid,
    /// The certification (or other entity) the event refers to, if any.
    pub related_entity_id: Option<Uuid>,
    /// Display name of the related certification.
    pub certification_name: Option<String>,
    /// Days until expiry for threshold events.
    pub days_value: Option<i64>,
    /// Field names changed by an update event.
    pub updated_fields: Vec<String>,
    /// The account that caused the event, when known.
    pub actor_account_id: Option<Uuid>,
    /// One-time plaintext credential; rides only in the rendered email,
    /// never in a persisted record.
    pub one_time_secret: Option<String>,
}

impl NotificationEvent {
    pub fn new(kind: NotificationKind, subject_profile_id: Uuid) -> Self {
        Self {
            kind,
            subject_profile_id,
            related_entity_id: None,
            certification_name: None,
            days_value: None,
            updated_fields: Vec::new(),
            actor_account_id: None,
            one_time_secret: None,
        }
    }

    pub fn with_certification(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.related_entity_id = Some(id);
        self.certification_name = Some(name.into());
        self
    }

    pub fn with_days(mut self, days: i64) -> Self {
        self.days_value = Some(days);
        self
    }

    pub fn with_updated_fields(mut self, fields: Vec<String>) -> Self {
        self.updated_fields = fields;
        self
    }

    pub fn with_actor(mut self, actor_account_id: Uuid) -> Self {
        self.actor_account_id = Some(actor_account_id);
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.one_time_secret = Some(secret.into());
        self
    }

    /// Event context persisted on each record. Deliberately excludes the
    /// one-time secret.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "subject_profile_id": self.subject_profile_id,
            "related_entity_id": self.related_entity_id,
            "certification_name": self.certification_name,
            "days_value": self.days_value,
            "updated_fields": self.updated_fields,
            "actor_account_id": self.actor_account_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_string_round_trip() {
        for kind in [
            NotificationKind::ProfileCreated,
            NotificationKind::ExpiryApproaching,
            NotificationKind::CredentialsIssued,
        ] {
            let parsed = NotificationKind::from_str(&kind.to_string()).unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_priority_sharpens_near_expiry() {
        let kind = NotificationKind::ExpiryApproaching;
        assert_eq!(kind.priority(Some(60)), Priority::Normal);
        assert_eq!(kind.priority(Some(7)), Priority::High);
        assert_eq!(kind.priority(Some(1)), Priority::High);
        assert_eq!(NotificationKind::Expired.priority(None), Priority::Urgent);
    }

    #[test]
    fn test_event_metadata_never_contains_secret() {
        let event = NotificationEvent::new(
            NotificationKind::CredentialsIssued,
            Uuid::now_v7(),
        )
        .with_secret("super-secret-password");

        let metadata = event.metadata().to_string();
        assert!(!metadata.contains("super-secret-password"));
    }
}
