use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProfileError, ProfileResult};
use crate::models::{Profile, ProfileFilter, VTID_POOL_END, VTID_POOL_START};

/// Repository trait for Profile persistence
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Create a new profile
    async fn create(&self, profile: Profile) -> ProfileResult<Profile>;

    /// Get a profile by ID
    async fn get_by_id(&self, id: Uuid) -> ProfileResult<Option<Profile>>;

    /// Get a profile by email (case-insensitive)
    async fn get_by_email(&self, email: &str) -> ProfileResult<Option<Profile>>;

    /// List profiles with optional filters
    async fn list(&self, filter: ProfileFilter) -> ProfileResult<Vec<Profile>>;

    /// Update an existing profile
    async fn update(&self, profile: Profile) -> ProfileResult<Profile>;

    /// Delete a profile by ID
    async fn delete(&self, id: Uuid) -> ProfileResult<bool>;

    /// Check if an email already exists
    async fn email_exists(&self, email: &str) -> ProfileResult<bool>;

    /// Allocate the next sequential VTID from the bounded pool
    async fn next_vtid(&self) -> ProfileResult<i32>;

    /// Check whether a staff code is already taken
    async fn staff_code_exists(&self, staff_code: i64) -> ProfileResult<bool>;
}

/// In-memory implementation of ProfileRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<Uuid, Profile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn create(&self, profile: Profile) -> ProfileResult<Profile> {
        let mut profiles = self.profiles.write().await;

        let email_exists = profiles
            .values()
            .any(|p| p.email.eq_ignore_ascii_case(&profile.email));

        if email_exists {
            return Err(ProfileError::DuplicateEmail(profile.email));
        }

        profiles.insert(profile.id, profile.clone());

        tracing::info!(profile_id = %profile.id, vtid = profile.vtid, "Created profile");
        Ok(profile)
    }

    async fn get_by_id(&self, id: Uuid) -> ProfileResult<Option<Profile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> ProfileResult<Option<Profile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self, filter: ProfileFilter) -> ProfileResult<Vec<Profile>> {
        let profiles = self.profiles.read().await;

        let mut result: Vec<Profile> = profiles
            .values()
            .filter(|p| {
                if let Some(ref department) = filter.department {
                    if p.department.as_deref() != Some(department.as_str()) {
                        return false;
                    }
                }
                if let Some(ref email) = filter.email {
                    if !p.email.eq_ignore_ascii_case(email) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        result.sort_by_key(|p| p.vtid);

        Ok(result)
    }

    async fn update(&self, profile: Profile) -> ProfileResult<Profile> {
        let mut profiles = self.profiles.write().await;

        let existing = profiles
            .get(&profile.id)
            .ok_or(ProfileError::NotFound(profile.id))?;

        // VTID is immutable once assigned
        if existing.vtid != profile.vtid {
            return Err(ProfileError::Validation(
                "VTID cannot be changed".to_string(),
            ));
        }

        let email_taken = profiles
            .values()
            .any(|p| p.id != profile.id && p.email.eq_ignore_ascii_case(&profile.email));

        if email_taken {
            return Err(ProfileError::DuplicateEmail(profile.email));
        }

        profiles.insert(profile.id, profile.clone());

        tracing::info!(profile_id = %profile.id, "Updated profile");
        Ok(profile)
    }

    async fn delete(&self, id: Uuid) -> ProfileResult<bool> {
        let mut profiles = self.profiles.write().await;

        if profiles.remove(&id).is_some() {
            tracing::info!(profile_id = %id, "Deleted profile");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn email_exists(&self, email: &str) -> ProfileResult<bool> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .values()
            .any(|p| p.email.eq_ignore_ascii_case(email)))
    }

    async fn next_vtid(&self) -> ProfileResult<i32> {
        let profiles = self.profiles.read().await;

        let next = profiles
            .values()
            .map(|p| p.vtid)
            .max()
            .map(|max| max + 1)
            .unwrap_or(VTID_POOL_START);

        if next > VTID_POOL_END {
            return Err(ProfileError::VtidPoolExhausted(
                VTID_POOL_START,
                VTID_POOL_END,
            ));
        }

        Ok(next)
    }

    async fn staff_code_exists(&self, staff_code: i64) -> ProfileResult<bool> {
        let profiles = self.profiles.read().await;
        Ok(profiles.values().any(|p| p.staff_code == staff_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProfile, UpdateProfile};

    fn create_input(first: &str, last: &str, email: &str) -> CreateProfile {
        CreateProfile {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            job_title: None,
            department: None,
            start_date: None,
            contact: Default::default(),
            address: Default::default(),
            emergency_contact: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_profile() {
        let repo = InMemoryProfileRepository::new();

        let profile = Profile::new(create_input("Sam", "Okafor", "sam@example.com"), 1000, 1);
        let created = repo.create(profile).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.full_name(), "Sam Okafor");
    }

    #[tokio::test]
    async fn test_next_vtid_is_sequential() {
        let repo = InMemoryProfileRepository::new();

        assert_eq!(repo.next_vtid().await.unwrap(), VTID_POOL_START);

        let vtid = repo.next_vtid().await.unwrap();
        let profile = Profile::new(create_input("Sam", "Okafor", "sam@example.com"), vtid, 1);
        repo.create(profile).await.unwrap();

        assert_eq!(repo.next_vtid().await.unwrap(), VTID_POOL_START + 1);
    }

    #[tokio::test]
    async fn test_next_vtid_pool_exhaustion() {
        let repo = InMemoryProfileRepository::new();

        let profile = Profile::new(
            create_input("Last", "Slot", "last@example.com"),
            VTID_POOL_END,
            1,
        );
        repo.create(profile).await.unwrap();

        let result = repo.next_vtid().await;
        assert!(matches!(result, Err(ProfileError::VtidPoolExhausted(_, _))));
    }

    #[tokio::test]
    async fn test_vtid_is_immutable_on_update() {
        let repo = InMemoryProfileRepository::new();

        let profile = Profile::new(create_input("Sam", "Okafor", "sam@example.com"), 1000, 1);
        let mut created = repo.create(profile).await.unwrap();

        created.vtid = 2000;
        let result = repo.update(created).await;
        assert!(matches!(result, Err(ProfileError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryProfileRepository::new();

        let first = Profile::new(create_input("Sam", "Okafor", "sam@example.com"), 1000, 1);
        repo.create(first).await.unwrap();

        let second = Profile::new(create_input("Sem", "Okafor", "SAM@example.com"), 1001, 2);
        let result = repo.create(second).await;
        assert!(matches!(result, Err(ProfileError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_update_applies_changes() {
        let repo = InMemoryProfileRepository::new();

        let profile = Profile::new(create_input("Sam", "Okafor", "sam@example.com"), 1000, 1);
        let mut created = repo.create(profile).await.unwrap();

        created.apply_update(UpdateProfile {
            department: Some("Operations".to_string()),
            ..Default::default()
        });
        let updated = repo.update(created).await.unwrap();

        assert_eq!(updated.department.as_deref(), Some("Operations"));
    }
}
