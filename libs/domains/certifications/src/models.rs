use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

use crate::error::{CertificationError, CertificationResult};

/// Review status of a certification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CertificationStatus {
    Approved,
    #[default]
    Pending,
    Rejected,
}

/// Metadata of an attached document; the bytes live in the external blob store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Key under which the blob store holds the file
    pub storage_key: String,
}

/// Certification entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    /// Unique identifier
    pub id: Uuid,
    pub name: String,
    /// Required grouping (e.g. "safety", "medical", "license")
    pub category: String,
    /// Owning profile; optional but expected
    pub profile_id: Option<Uuid>,
    /// Denormalized holder display name, synced with the owning profile
    pub holder_name: String,
    pub issue_date: Option<NaiveDate>,
    /// Must be strictly after issue_date when both are set
    pub expiry_date: Option<NaiveDate>,
    pub status: CertificationStatus,
    pub document: Option<DocumentMeta>,
    /// Monetary cost of obtaining/renewing
    pub cost: Option<f64>,
    /// When the expired notice was sent; unset means not yet notified
    pub expiry_notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a certification
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCertification {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub profile_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: CertificationStatus,
    pub document: Option<DocumentMeta>,
    #[validate(range(min = 0.0))]
    pub cost: Option<f64>,
}

/// DTO for updating a certification
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCertification {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: Option<CertificationStatus>,
    pub document: Option<DocumentMeta>,
    #[validate(range(min = 0.0))]
    pub cost: Option<f64>,
}

/// Query filters for listing certifications
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CertificationFilter {
    pub profile_id: Option<Uuid>,
    pub category: Option<String>,
    pub status: Option<CertificationStatus>,
}

/// The expiry-after-issue invariant, checked before any mutation side effect.
pub fn ensure_expiry_after_issue(
    issue_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
) -> CertificationResult<()> {
    if let (Some(issue), Some(expiry)) = (issue_date, expiry_date) {
        if expiry <= issue {
            return Err(CertificationError::InvalidDates { issue, expiry });
        }
    }
    Ok(())
}

impl Certification {
    /// Create a new certification; the holder name comes from the owning
    /// profile (or stays empty for an unowned record).
    pub fn new(input: CreateCertification, holder_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            category: input.category,
            profile_id: input.profile_id,
            holder_name,
            issue_date: input.issue_date,
            expiry_date: input.expiry_date,
            status: input.status,
            document: input.document,
            cost: input.cost,
            expiry_notified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update, returning the names of fields that actually changed.
    pub fn apply_update(&mut self, update: UpdateCertification) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(name) = update.name {
            if self.name != name {
                self.name = name;
                changed.push("name");
            }
        }
        if let Some(category) = update.category {
            if self.category != category {
                self.category = category;
                changed.push("category");
            }
        }
        if let Some(issue_date) = update.issue_date {
            if self.issue_date != Some(issue_date) {
                self.issue_date = Some(issue_date);
                changed.push("issue_date");
            }
        }
        if let Some(expiry_date) = update.expiry_date {
            if self.expiry_date != Some(expiry_date) {
                self.expiry_date = Some(expiry_date);
                // A moved expiry date re-arms the expired notice
                self.expiry_notified_at = None;
                changed.push("expiry_date");
            }
        }
        if let Some(status) = update.status {
            if self.status != status {
                self.status = status;
                changed.push("status");
            }
        }
        if let Some(document) = update.document {
            if self.document.as_ref() != Some(&document) {
                self.document = Some(document);
                changed.push("document");
            }
        }
        if let Some(cost) = update.cost {
            if self.cost != Some(cost) {
                self.cost = Some(cost);
                changed.push("cost");
            }
        }

        if !changed.is_empty() {
            self.updated_at = Utc::now();
        }

        changed
    }

    /// Whole calendar days until expiry, negative once past. `None` when no
    /// expiry date is set.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date.map(|expiry| (expiry - today).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input(name: &str) -> CreateCertification {
        CreateCertification {
            name: name.to_string(),
            category: "safety".to_string(),
            profile_id: Some(Uuid::now_v7()),
            issue_date: None,
            expiry_date: None,
            status: CertificationStatus::Approved,
            document: None,
            cost: None,
        }
    }

    #[test]
    fn test_ensure_expiry_after_issue_rejects_inverted_dates() {
        let issue = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        assert!(ensure_expiry_after_issue(Some(issue), Some(expiry)).is_err());
        assert!(ensure_expiry_after_issue(Some(issue), Some(issue)).is_err());
    }

    #[test]
    fn test_ensure_expiry_after_issue_allows_open_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        assert!(ensure_expiry_after_issue(None, Some(date)).is_ok());
        assert!(ensure_expiry_after_issue(Some(date), None).is_ok());
        assert!(ensure_expiry_after_issue(None, None).is_ok());
    }

    #[test]
    fn test_days_until_expiry() {
        let mut cert = Certification::new(create_input("Forklift"), "Sam Okafor".to_string());
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();

        assert_eq!(cert.days_until_expiry(today), None);

        cert.expiry_date = NaiveDate::from_ymd_opt(2026, 2, 9);
        assert_eq!(cert.days_until_expiry(today), Some(30));

        cert.expiry_date = NaiveDate::from_ymd_opt(2026, 1, 8);
        assert_eq!(cert.days_until_expiry(today), Some(-2));
    }

    #[test]
    fn test_moving_expiry_date_rearms_notice() {
        let mut cert = Certification::new(create_input("First Aid"), "Sam Okafor".to_string());
        cert.expiry_notified_at = Some(Utc::now());

        let changed = cert.apply_update(UpdateCertification {
            expiry_date: NaiveDate::from_ymd_opt(2027, 1, 1),
            ..Default::default()
        });

        assert_eq!(changed, vec!["expiry_date"]);
        assert!(cert.expiry_notified_at.is_none());
    }

    #[test]
    fn test_status_string_round_trip() {
        use std::str::FromStr;

        assert_eq!(CertificationStatus::Approved.to_string(), "approved");
        assert_eq!(
            CertificationStatus::from_str("rejected").unwrap(),
            CertificationStatus::Rejected
        );
    }
}
