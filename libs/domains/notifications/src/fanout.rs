//! Notification fan-out engine.
//!
//! Takes one domain event and spreads it across the recipient set (the
//! subject employee first, then every administrator) and across both
//! channels (persisted record + delivery gateway). Best-effort by contract:
//! nothing that happens in here propagates an error to the caller, and no
//! recipient or channel failure bleeds into another.

use std::sync::Arc;

use domain_accounts::{Account, AccountRepository};
use domain_profiles::Profile;
use tracing::{debug, info, warn};

use crate::gateway::DeliveryGateway;
use crate::models::{Notification, NotificationEvent, NotificationKind};
use crate::repository::NotificationRepository;
use crate::templates::MessageCatalog;
use crate::NotificationResult;

/// Fan-out engine over the record store, the account directory and the
/// delivery gateway.
pub struct FanoutEngine {
    notifications: Arc<dyn NotificationRepository>,
    accounts: Arc<dyn AccountRepository>,
    gateway: Arc<dyn DeliveryGateway>,
    catalog: MessageCatalog,
}

impl FanoutEngine {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        accounts: Arc<dyn AccountRepository>,
        gateway: Arc<dyn DeliveryGateway>,
    ) -> NotificationResult<Self> {
        Ok(Self {
            notifications,
            accounts,
            gateway,
            catalog: MessageCatalog::new()?,
        })
    }

    /// Fan one event out to its recipients.
    ///
    /// Returns the notification records that were actually created; partial
    /// results are normal under failure.
    pub async fn notify(
        &self,
        profile: &Profile,
        event: &NotificationEvent,
    ) -> Vec<Notification> {
        let subject = self.resolve_subject(profile).await;

        // The one-time credential is for the employee alone
        let admins = if event.kind == NotificationKind::CredentialsIssued {
            Vec::new()
        } else {
            self.resolve_admins().await
        };

        let subject_id = subject.as_ref().map(|a| a.id);
        if subject.is_none() {
            debug!(
                profile_id = %profile.id,
                kind = %event.kind,
                "Subject has no account; notifying administrators only"
            );
        }

        let mut created = Vec::new();

        // Subject first, then admins; an admin subject is included exactly once
        if let Some(account) = subject {
            if let Some(notification) = self.notify_one(&account, profile, event, false).await {
                created.push(notification);
            }
        }

        for admin in admins {
            if Some(admin.id) == subject_id {
                continue;
            }
            if let Some(notification) = self.notify_one(&admin, profile, event, true).await {
                created.push(notification);
            }
        }

        info!(
            kind = %event.kind,
            profile_id = %profile.id,
            records = created.len(),
            "Fan-out complete"
        );

        created
    }

    /// One recipient, two independent channels.
    async fn notify_one(
        &self,
        account: &Account,
        profile: &Profile,
        event: &NotificationEvent,
        for_admin: bool,
    ) -> Option<Notification> {
        // Without rendered text neither channel can proceed
        let record_message = match self.catalog.render(event, profile, for_admin, false) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(account_id = %account.id, kind = %event.kind, error = %e, "Render failed");
                return None;
            }
        };

        let record = Notification::new(
            account.id,
            event.kind,
            event.kind.priority(event.days_value),
            record_message.body,
            event.metadata(),
        );

        let stored = match self.notifications.insert(record).await {
            Ok(notification) => {
                observability::counter!("notification_records_total", "kind" => event.kind.to_string())
                    .increment(1);
                Some(notification)
            }
            Err(e) => {
                // Logged and skipped; no synchronous retry, and delivery below
                // still gets its attempt
                warn!(
                    account_id = %account.id,
                    kind = %event.kind,
                    error = %e,
                    "Failed to store notification record"
                );
                None
            }
        };

        // Delivery channel: secrets ride only here, and only to the subject
        let delivery_message = match self.catalog.render(event, profile, for_admin, !for_admin) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(account_id = %account.id, kind = %event.kind, error = %e, "Render failed");
                return stored;
            }
        };

        let delivery = self
            .gateway
            .send(&account.email, &delivery_message.subject, &delivery_message.body)
            .await;

        if delivery.accepted {
            observability::counter!("notification_deliveries_total", "outcome" => "accepted")
                .increment(1);
        } else {
            observability::counter!("notification_deliveries_total", "outcome" => "failed")
                .increment(1);
            warn!(
                account_id = %account.id,
                to = %account.email,
                gateway = self.gateway.name(),
                error = ?delivery.error,
                "Delivery failed; persisted record is kept"
            );
        }

        stored
    }

    async fn resolve_subject(&self, profile: &Profile) -> Option<Account> {
        // Explicit back-reference wins; the email join key covers legacy rows
        match self.accounts.get_by_profile_id(profile.id).await {
            Ok(Some(account)) => return Some(account),
            Ok(None) => {}
            Err(e) => {
                warn!(profile_id = %profile.id, error = %e, "Subject lookup by profile failed");
                return None;
            }
        }

        match self.accounts.get_by_email(&profile.email).await {
            Ok(account) => account,
            Err(e) => {
                warn!(profile_id = %profile.id, error = %e, "Subject lookup by email failed");
                None
            }
        }
    }

    async fn resolve_admins(&self) -> Vec<Account> {
        match self.accounts.list_admins().await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(error = %e, "Administrator lookup failed; skipping admin audience");
                Vec::new()
            }
        }
    }
}
