use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CertificationError, CertificationResult};
use crate::models::{Certification, CertificationFilter};

/// Repository trait for Certification persistence
#[async_trait]
pub trait CertificationRepository: Send + Sync {
    /// Create a new certification
    async fn create(&self, certification: Certification) -> CertificationResult<Certification>;

    /// Get a certification by ID
    async fn get_by_id(&self, id: Uuid) -> CertificationResult<Option<Certification>>;

    /// List certifications with optional filters
    async fn list(&self, filter: CertificationFilter) -> CertificationResult<Vec<Certification>>;

    /// List every certification that has an expiry date set (the scan input)
    async fn list_with_expiry(&self) -> CertificationResult<Vec<Certification>>;

    /// Update an existing certification
    async fn update(&self, certification: Certification) -> CertificationResult<Certification>;

    /// Delete a certification by ID
    async fn delete(&self, id: Uuid) -> CertificationResult<bool>;

    /// Bulk-rewrite the denormalized holder name for one profile's
    /// certifications; returns the number touched
    async fn update_holder_name(
        &self,
        profile_id: Uuid,
        holder_name: &str,
    ) -> CertificationResult<u64>;

    /// Delete all certifications owned by a profile, returning the removed
    /// records (each one becomes a deletion event)
    async fn delete_by_profile(&self, profile_id: Uuid) -> CertificationResult<Vec<Certification>>;

    /// Persist the expired-notice idempotency marker
    async fn mark_expiry_notified(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> CertificationResult<()>;
}

/// In-memory implementation of CertificationRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCertificationRepository {
    certifications: Arc<RwLock<HashMap<Uuid, Certification>>>,
}

impl InMemoryCertificationRepository {
    pub fn new() -> Self {
        Self {
            certifications: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl CertificationRepository for InMemoryCertificationRepository {
    async fn create(&self, certification: Certification) -> CertificationResult<Certification> {
        let mut certifications = self.certifications.write().await;
        certifications.insert(certification.id, certification.clone());

        tracing::info!(cert_id = %certification.id, name = %certification.name, "Created certification");
        Ok(certification)
    }

    async fn get_by_id(&self, id: Uuid) -> CertificationResult<Option<Certification>> {
        let certifications = self.certifications.read().await;
        Ok(certifications.get(&id).cloned())
    }

    async fn list(&self, filter: CertificationFilter) -> CertificationResult<Vec<Certification>> {
        let certifications = self.certifications.read().await;

        let mut result: Vec<Certification> = certifications
            .values()
            .filter(|c| {
                if let Some(profile_id) = filter.profile_id {
                    if c.profile_id != Some(profile_id) {
                        return false;
                    }
                }
                if let Some(ref category) = filter.category {
                    if &c.category != category {
                        return false;
                    }
                }
                if let Some(status) = filter.status {
                    if c.status != status {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(result)
    }

    async fn list_with_expiry(&self) -> CertificationResult<Vec<Certification>> {
        let certifications = self.certifications.read().await;

        let mut result: Vec<Certification> = certifications
            .values()
            .filter(|c| c.expiry_date.is_some())
            .cloned()
            .collect();

        result.sort_by_key(|c| c.expiry_date);

        Ok(result)
    }

    async fn update(&self, certification: Certification) -> CertificationResult<Certification> {
        let mut certifications = self.certifications.write().await;

        if !certifications.contains_key(&certification.id) {
            return Err(CertificationError::NotFound(certification.id));
        }

        certifications.insert(certification.id, certification.clone());

        tracing::info!(cert_id = %certification.id, "Updated certification");
        Ok(certification)
    }

    async fn delete(&self, id: Uuid) -> CertificationResult<bool> {
        let mut certifications = self.certifications.write().await;

        if certifications.remove(&id).is_some() {
            tracing::info!(cert_id = %id, "Deleted certification");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn update_holder_name(
        &self,
        profile_id: Uuid,
        holder_name: &str,
    ) -> CertificationResult<u64> {
        let mut certifications = self.certifications.write().await;

        let mut touched = 0;
        for certification in certifications.values_mut() {
            if certification.profile_id == Some(profile_id) {
                certification.holder_name = holder_name.to_string();
                certification.updated_at = Utc::now();
                touched += 1;
            }
        }

        tracing::info!(profile_id = %profile_id, count = touched, "Rewrote holder name");
        Ok(touched)
    }

    async fn delete_by_profile(
        &self,
        profile_id: Uuid,
    ) -> CertificationResult<Vec<Certification>> {
        let mut certifications = self.certifications.write().await;

        let doomed: Vec<Uuid> = certifications
            .values()
            .filter(|c| c.profile_id == Some(profile_id))
            .map(|c| c.id)
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for id in doomed {
            if let Some(certification) = certifications.remove(&id) {
                removed.push(certification);
            }
        }

        tracing::info!(profile_id = %profile_id, count = removed.len(), "Deleted certifications for profile");
        Ok(removed)
    }

    async fn mark_expiry_notified(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> CertificationResult<()> {
        let mut certifications = self.certifications.write().await;

        let certification = certifications
            .get_mut(&id)
            .ok_or(CertificationError::NotFound(id))?;

        certification.expiry_notified_at = Some(at);
        Ok(())
    }
}
