//! Entity synchronization engine.
//!
//! Owns every mutation that touches more than one of the linked entities
//! (account, profile, certification). The consistency work runs inline,
//! before the operation returns to its caller; the notification fan-out is
//! enqueued and handled in the background.
//!
//! Deletion runs certifications → account → profile row, so that a failure
//! partway leaves at most orphaned certifications and never an account
//! pointing at a dead profile.

use std::sync::Arc;

use domain_accounts::{credentials, Account, AccountRepository, Role};
use domain_certifications::{
    ensure_expiry_after_issue, Certification, CertificationRepository, CreateCertification,
    UpdateCertification,
};
use domain_notifications::{NotificationEvent, NotificationKind};
use domain_profiles::{CreateProfile, Profile, ProfileRepository, UpdateProfile};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use crate::error::{ComplianceError, ComplianceResult};
use crate::queue::FanoutQueue;

/// Attempts at finding a free random staff code before giving up.
const STAFF_CODE_ATTEMPTS: usize = 16;

/// Result of provisioning a profile (and possibly its account).
#[derive(Debug, Clone)]
pub struct ProfileProvisioned {
    pub profile: Profile,
    pub account: Account,
    /// True when the account was synthesized and a one-time credential issued.
    pub credentials_issued: bool,
}

/// Result of a cascading profile deletion.
#[derive(Debug, Clone)]
pub struct ProfileRemoval {
    pub profile: Profile,
    pub certifications_deleted: usize,
    pub account_deleted: bool,
}

/// Synchronization engine over the three entity repositories.
pub struct SyncEngine {
    profiles: Arc<dyn ProfileRepository>,
    accounts: Arc<dyn AccountRepository>,
    certifications: Arc<dyn CertificationRepository>,
    queue: FanoutQueue,
}

impl SyncEngine {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        accounts: Arc<dyn AccountRepository>,
        certifications: Arc<dyn CertificationRepository>,
        queue: FanoutQueue,
    ) -> Self {
        Self {
            profiles,
            accounts,
            certifications,
            queue,
        }
    }

    /// Create a profile; synthesize and link a `user`-role account when none
    /// exists for its email.
    pub async fn create_profile(
        &self,
        input: CreateProfile,
        actor_account_id: Option<Uuid>,
    ) -> ComplianceResult<ProfileProvisioned> {
        input
            .validate()
            .map_err(|e| ComplianceError::Validation(e.to_string()))?;

        let vtid = self.profiles.next_vtid().await?;
        let staff_code = self.free_staff_code().await?;

        let mut profile = Profile::new(input, vtid, staff_code);

        let existing = self.accounts.get_by_email(&profile.email).await?;

        let (profile, account, secret) = match existing {
            Some(mut account) => {
                // The email join key found an account; link both sides
                if account.profile_id.is_some() && account.profile_id != Some(profile.id) {
                    return Err(ComplianceError::Validation(format!(
                        "Account '{}' is already linked to another profile",
                        account.email
                    )));
                }

                profile.account_id = Some(account.id);
                let profile = self.profiles.create(profile).await?;

                account.profile_id = Some(profile.id);
                let account = self.accounts.update(account).await?;

                (profile, account, None)
            }
            None => {
                let profile = self.profiles.create(profile).await?;

                let password = credentials::generate_password();
                let password_hash = credentials::hash_password(&password)?;

                let mut account =
                    Account::new(profile.email.clone(), None, password_hash, Role::User);
                account.profile_id = Some(profile.id);
                let account = self.accounts.create(account).await?;

                let mut profile = profile;
                profile.account_id = Some(account.id);
                let profile = self.profiles.update(profile).await?;

                (profile, account, Some(password))
            }
        };

        info!(
            profile_id = %profile.id,
            vtid = profile.vtid,
            account_id = %account.id,
            synthesized = secret.is_some(),
            "Provisioned profile"
        );

        let credentials_issued = secret.is_some();
        if let Some(secret) = secret {
            // The plaintext exists only on this event, bound for the
            // delivery channel; nothing persists it
            self.queue.enqueue(
                &profile,
                with_actor(
                    NotificationEvent::new(NotificationKind::CredentialsIssued, profile.id)
                        .with_secret(secret),
                    actor_account_id,
                ),
            );
        }

        self.queue.enqueue(
            &profile,
            with_actor(
                NotificationEvent::new(NotificationKind::ProfileCreated, profile.id),
                actor_account_id,
            ),
        );

        Ok(ProfileProvisioned {
            profile,
            account,
            credentials_issued,
        })
    }

    /// Update a profile and re-establish the cross-entity invariants its
    /// changes disturb.
    pub async fn update_profile(
        &self,
        profile_id: Uuid,
        input: UpdateProfile,
        actor_account_id: Option<Uuid>,
    ) -> ComplianceResult<Profile> {
        input
            .validate()
            .map_err(|e| ComplianceError::Validation(e.to_string()))?;

        let mut profile = self
            .profiles
            .get_by_id(profile_id)
            .await?
            .ok_or(ComplianceError::ProfileNotFound(profile_id))?;

        let changed = profile.apply_update(input);
        if changed.is_empty() {
            debug!(profile_id = %profile_id, "Update changed nothing");
            return Ok(profile);
        }

        let email_changed = changed.contains(&"email");
        let name_changed = changed.contains(&"first_name") || changed.contains(&"last_name");

        // Reject an email collision before any write happens
        if email_changed {
            if let Some(other) = self.accounts.get_by_email(&profile.email).await? {
                if other.profile_id != Some(profile_id) {
                    return Err(ComplianceError::Validation(format!(
                        "Email '{}' is already taken by another account",
                        profile.email
                    )));
                }
            }
        }

        let profile = self.profiles.update(profile).await?;

        if name_changed {
            let touched = self
                .certifications
                .update_holder_name(profile_id, &profile.full_name())
                .await?;
            info!(
                profile_id = %profile_id,
                certifications = touched,
                "Synced holder name after rename"
            );
        }

        if email_changed {
            match self.accounts.get_by_profile_id(profile_id).await? {
                Some(mut account) => {
                    // Keep a username that mirrored the old address in step
                    if account
                        .username
                        .as_deref()
                        .is_some_and(|u| u.eq_ignore_ascii_case(&account.email))
                    {
                        account.username = Some(profile.email.clone());
                    }
                    account.email = profile.email.clone();
                    self.accounts.update(account).await?;
                    info!(profile_id = %profile_id, "Synced account email after change");
                }
                None => {
                    debug!(profile_id = %profile_id, "No linked account; email sync is a no-op");
                }
            }
        }

        self.queue.enqueue(
            &profile,
            with_actor(
                NotificationEvent::new(NotificationKind::ProfileUpdated, profile.id)
                    .with_updated_fields(changed.iter().map(|s| s.to_string()).collect()),
                actor_account_id,
            ),
        );

        Ok(profile)
    }

    /// Delete a profile and cascade: certifications first, then the paired
    /// `user`-role account, then the profile row, then the events.
    pub async fn delete_profile(
        &self,
        profile_id: Uuid,
        actor_account_id: Option<Uuid>,
    ) -> ComplianceResult<ProfileRemoval> {
        let profile = self
            .profiles
            .get_by_id(profile_id)
            .await?
            .ok_or(ComplianceError::ProfileNotFound(profile_id))?;

        let removed_certifications = self.certifications.delete_by_profile(profile_id).await?;

        let account_deleted = match self.accounts.get_by_email(&profile.email).await? {
            Some(account) if account.role == Role::User => {
                self.accounts.delete(account.id).await?;
                true
            }
            Some(mut account) => {
                // Admin accounts are never removed by a profile cascade;
                // only the link is cleared
                if account.profile_id == Some(profile_id) {
                    account.profile_id = None;
                    self.accounts.update(account).await?;
                }
                info!(role = "admin", "Paired account kept (admin role)");
                false
            }
            None => false,
        };

        self.profiles.delete(profile_id).await?;

        info!(
            profile_id = %profile_id,
            certifications = removed_certifications.len(),
            account_deleted = account_deleted,
            "Deleted profile cascade"
        );

        for certification in &removed_certifications {
            self.queue.enqueue(
                &profile,
                with_actor(
                    NotificationEvent::new(NotificationKind::CertificationDeleted, profile.id)
                        .with_certification(certification.id, certification.name.clone()),
                    actor_account_id,
                ),
            );
        }

        self.queue.enqueue(
            &profile,
            with_actor(
                NotificationEvent::new(NotificationKind::ProfileDeleted, profile.id),
                actor_account_id,
            ),
        );

        Ok(ProfileRemoval {
            profile,
            certifications_deleted: removed_certifications.len(),
            account_deleted,
        })
    }

    /// Change an account's email and propagate it to the linked profile.
    pub async fn change_account_email(
        &self,
        account_id: Uuid,
        new_email: &str,
    ) -> ComplianceResult<Account> {
        if !new_email.validate_email() {
            return Err(ComplianceError::Validation(format!(
                "'{}' is not a valid email address",
                new_email
            )));
        }

        let mut account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(ComplianceError::AccountNotFound(account_id))?;

        if account.email_matches(new_email) {
            return Ok(account);
        }

        if let Some(other) = self.accounts.get_by_email(new_email).await? {
            if other.id != account_id {
                return Err(ComplianceError::Validation(format!(
                    "Email '{}' is already taken by another account",
                    new_email
                )));
            }
        }
        if let Some(other) = self.profiles.get_by_email(new_email).await? {
            if Some(other.id) != account.profile_id {
                return Err(ComplianceError::Validation(format!(
                    "Email '{}' is already taken by another profile",
                    new_email
                )));
            }
        }

        account.email = new_email.to_string();
        let account = self.accounts.update(account).await?;

        if let Some(profile_id) = account.profile_id {
            match self.profiles.get_by_id(profile_id).await? {
                Some(mut profile) => {
                    profile.email = account.email.clone();
                    self.profiles.update(profile).await?;
                    info!(account_id = %account_id, profile_id = %profile_id, "Synced profile email after account change");
                }
                None => {
                    warn!(account_id = %account_id, profile_id = %profile_id, "Linked profile missing during email sync");
                }
            }
        }

        Ok(account)
    }

    /// Create a certification; the date invariant is checked before any
    /// side effect and the holder name comes from the owning profile.
    pub async fn create_certification(
        &self,
        input: CreateCertification,
        actor_account_id: Option<Uuid>,
    ) -> ComplianceResult<Certification> {
        input
            .validate()
            .map_err(|e| ComplianceError::Validation(e.to_string()))?;
        ensure_expiry_after_issue(input.issue_date, input.expiry_date)?;

        let owner = match input.profile_id {
            Some(profile_id) => Some(
                self.profiles
                    .get_by_id(profile_id)
                    .await?
                    .ok_or(ComplianceError::ProfileNotFound(profile_id))?,
            ),
            None => None,
        };

        let holder_name = owner.as_ref().map(|p| p.full_name()).unwrap_or_default();
        let certification = self
            .certifications
            .create(Certification::new(input, holder_name))
            .await?;

        if let Some(profile) = owner {
            self.queue.enqueue(
                &profile,
                with_actor(
                    NotificationEvent::new(NotificationKind::CertificationCreated, profile.id)
                        .with_certification(certification.id, certification.name.clone()),
                    actor_account_id,
                ),
            );
        }

        Ok(certification)
    }

    /// Update a certification, rejecting date-order violations before any
    /// side effect.
    pub async fn update_certification(
        &self,
        certification_id: Uuid,
        input: UpdateCertification,
        actor_account_id: Option<Uuid>,
    ) -> ComplianceResult<Certification> {
        input
            .validate()
            .map_err(|e| ComplianceError::Validation(e.to_string()))?;

        let mut certification = self
            .certifications
            .get_by_id(certification_id)
            .await?
            .ok_or(ComplianceError::CertificationNotFound(certification_id))?;

        // Check the dates the record would end up with
        let issue = input.issue_date.or(certification.issue_date);
        let expiry = input.expiry_date.or(certification.expiry_date);
        ensure_expiry_after_issue(issue, expiry)?;

        let changed = certification.apply_update(input);
        if changed.is_empty() {
            return Ok(certification);
        }

        let certification = self.certifications.update(certification).await?;

        if let Some(profile_id) = certification.profile_id {
            if let Some(profile) = self.profiles.get_by_id(profile_id).await? {
                self.queue.enqueue(
                    &profile,
                    with_actor(
                        NotificationEvent::new(
                            NotificationKind::CertificationUpdated,
                            profile.id,
                        )
                        .with_certification(certification.id, certification.name.clone())
                        .with_updated_fields(changed.iter().map(|s| s.to_string()).collect()),
                        actor_account_id,
                    ),
                );
            }
        }

        Ok(certification)
    }

    /// Delete a certification.
    pub async fn delete_certification(
        &self,
        certification_id: Uuid,
        actor_account_id: Option<Uuid>,
    ) -> ComplianceResult<Certification> {
        let certification = self
            .certifications
            .get_by_id(certification_id)
            .await?
            .ok_or(ComplianceError::CertificationNotFound(certification_id))?;

        self.certifications.delete(certification_id).await?;

        if let Some(profile_id) = certification.profile_id {
            if let Some(profile) = self.profiles.get_by_id(profile_id).await? {
                self.queue.enqueue(
                    &profile,
                    with_actor(
                        NotificationEvent::new(
                            NotificationKind::CertificationDeleted,
                            profile.id,
                        )
                        .with_certification(certification.id, certification.name.clone()),
                        actor_account_id,
                    ),
                );
            }
        }

        Ok(certification)
    }

    async fn free_staff_code(&self) -> ComplianceResult<i64> {
        for _ in 0..STAFF_CODE_ATTEMPTS {
            let candidate = domain_profiles::models::generate_staff_code();
            if !self.profiles.staff_code_exists(candidate).await? {
                return Ok(candidate);
            }
        }

        Err(ComplianceError::Validation(
            "Could not allocate a unique staff code".to_string(),
        ))
    }
}

fn with_actor(event: NotificationEvent, actor_account_id: Option<Uuid>) -> NotificationEvent {
    match actor_account_id {
        Some(actor) => event.with_actor(actor),
        None => event,
    }
}
