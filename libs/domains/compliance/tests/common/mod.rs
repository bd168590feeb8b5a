//! Shared test harness: the full orchestration stack wired over in-memory
//! stores and the in-memory delivery gateway.

use std::sync::Arc;

use chrono::NaiveDate;
use domain_accounts::{Account, AccountRepository, InMemoryAccountRepository, Role};
use domain_certifications::{
    CertificationStatus, CreateCertification, InMemoryCertificationRepository,
};
use domain_compliance::{ExpiryScanner, FanoutQueue, FanoutWorker, SyncEngine};
use domain_notifications::{FanoutEngine, InMemoryGateway, InMemoryNotificationRepository};
use domain_profiles::{CreateProfile, InMemoryProfileRepository};
use uuid::Uuid;

pub struct Harness {
    pub profiles: InMemoryProfileRepository,
    pub accounts: InMemoryAccountRepository,
    pub certifications: InMemoryCertificationRepository,
    pub notifications: InMemoryNotificationRepository,
    pub gateway: InMemoryGateway,
    pub sync: SyncEngine,
    pub scanner: ExpiryScanner,
    worker: FanoutWorker,
}

impl Harness {
    pub fn new() -> Self {
        let profiles = InMemoryProfileRepository::new();
        let accounts = InMemoryAccountRepository::new();
        let certifications = InMemoryCertificationRepository::new();
        let notifications = InMemoryNotificationRepository::new();
        let gateway = InMemoryGateway::new();

        let engine = Arc::new(
            FanoutEngine::new(
                Arc::new(notifications.clone()),
                Arc::new(accounts.clone()),
                Arc::new(gateway.clone()),
            )
            .expect("catalog construction"),
        );

        let (queue, rx) = FanoutQueue::bounded(64);
        let worker = FanoutWorker::new(rx, engine.clone());

        let sync = SyncEngine::new(
            Arc::new(profiles.clone()),
            Arc::new(accounts.clone()),
            Arc::new(certifications.clone()),
            queue,
        );

        let scanner = ExpiryScanner::new(
            Arc::new(certifications.clone()),
            Arc::new(profiles.clone()),
            engine,
        );

        Self {
            profiles,
            accounts,
            certifications,
            notifications,
            gateway,
            sync,
            scanner,
            worker,
        }
    }

    /// Run all queued fan-out jobs; returns how many ran.
    pub async fn drain(&mut self) -> usize {
        self.worker.process_pending().await
    }

    pub async fn add_admin(&self, email: &str) -> Account {
        self.accounts
            .create(Account::new(
                email.to_string(),
                None,
                "hash".to_string(),
                Role::Admin,
            ))
            .await
            .unwrap()
    }
}

pub fn profile_input(first: &str, last: &str, email: &str) -> CreateProfile {
    CreateProfile {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        job_title: Some("Technician".to_string()),
        department: Some("Operations".to_string()),
        start_date: None,
        contact: Default::default(),
        address: Default::default(),
        emergency_contact: None,
    }
}

pub fn certification_input(
    name: &str,
    profile_id: Option<Uuid>,
    issue: Option<NaiveDate>,
    expiry: Option<NaiveDate>,
) -> CreateCertification {
    CreateCertification {
        name: name.to_string(),
        category: "safety".to_string(),
        profile_id,
        issue_date: issue,
        expiry_date: expiry,
        status: CertificationStatus::Approved,
        document: None,
        cost: Some(150.0),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
