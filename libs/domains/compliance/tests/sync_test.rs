//! Integration tests for the entity synchronization engine: cross-entity
//! consistency after every mutation, account provisioning, and the deletion
//! cascade, exercised over the full in-memory stack.

mod common;

use common::{certification_input, date, profile_input, Harness};
use domain_accounts::{Account, AccountRepository, Role};
use domain_certifications::{CertificationFilter, CertificationRepository};
use domain_compliance::ComplianceError;
use domain_notifications::{NotificationKind, NotificationRepository};
use domain_profiles::{ProfileRepository, UpdateProfile};

#[tokio::test]
async fn creating_profile_without_account_provisions_exactly_one_linked_account() {
    let mut h = Harness::new();
    h.add_admin("admin@example.com").await;

    let provisioned = h
        .sync
        .create_profile(profile_input("Ada", "Quist", "ada@example.com"), None)
        .await
        .unwrap();

    assert!(provisioned.credentials_issued);
    assert_eq!(provisioned.account.role, Role::User);

    // Bidirectional link
    assert_eq!(
        provisioned.profile.account_id,
        Some(provisioned.account.id)
    );
    assert_eq!(
        provisioned.account.profile_id,
        Some(provisioned.profile.id)
    );

    // Exactly one user-role account exists for that email
    let account = h
        .accounts
        .get_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.id, provisioned.account.id);

    h.drain().await;

    // Exactly one credentials message, addressed to the profile's email
    let credential_mails: Vec<_> = h
        .gateway
        .sent()
        .await
        .into_iter()
        .filter(|m| m.subject == "Your login credentials")
        .collect();
    assert_eq!(credential_mails.len(), 1);
    assert_eq!(credential_mails[0].to, "ada@example.com");
    assert!(credential_mails[0].body.contains("one-time password is:"));

    // The persisted records never carry the plaintext
    let password = credential_mails[0]
        .body
        .split("one-time password is: ")
        .nth(1)
        .unwrap()
        .split_whitespace()
        .next()
        .unwrap();
    let subject_records = h
        .notifications
        .list_by_account(provisioned.account.id, Default::default())
        .await
        .unwrap();
    assert!(!subject_records.is_empty());
    assert!(subject_records.iter().all(|n| !n.message.contains(password)));
}

#[tokio::test]
async fn creating_profile_with_existing_account_links_without_new_credentials() {
    let mut h = Harness::new();

    let existing = h
        .accounts
        .create(Account::new(
            "lee@example.com".to_string(),
            None,
            "hash".to_string(),
            Role::User,
        ))
        .await
        .unwrap();

    let provisioned = h
        .sync
        .create_profile(profile_input("Lee", "Osei", "lee@example.com"), None)
        .await
        .unwrap();

    assert!(!provisioned.credentials_issued);
    assert_eq!(provisioned.account.id, existing.id);
    assert_eq!(
        provisioned.account.profile_id,
        Some(provisioned.profile.id)
    );

    h.drain().await;

    let credential_mails: Vec<_> = h
        .gateway
        .sent()
        .await
        .into_iter()
        .filter(|m| m.subject == "Your login credentials")
        .collect();
    assert!(credential_mails.is_empty());
}

#[tokio::test]
async fn renaming_profile_rewrites_holder_name_on_its_certifications_only() {
    let mut h = Harness::new();

    let a = h
        .sync
        .create_profile(profile_input("Mara", "Silva", "mara@example.com"), None)
        .await
        .unwrap()
        .profile;
    let b = h
        .sync
        .create_profile(profile_input("Tom", "Reyes", "tom@example.com"), None)
        .await
        .unwrap()
        .profile;

    h.sync
        .create_certification(
            certification_input("Forklift", Some(a.id), None, Some(date(2027, 1, 1))),
            None,
        )
        .await
        .unwrap();
    h.sync
        .create_certification(
            certification_input("First Aid", Some(a.id), None, Some(date(2027, 6, 1))),
            None,
        )
        .await
        .unwrap();
    h.sync
        .create_certification(
            certification_input("Crane", Some(b.id), None, Some(date(2027, 1, 1))),
            None,
        )
        .await
        .unwrap();

    h.sync
        .update_profile(
            a.id,
            UpdateProfile {
                last_name: Some("Silva-Costa".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let a_certs = h
        .certifications
        .list(CertificationFilter {
            profile_id: Some(a.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(a_certs.len(), 2);
    assert!(a_certs.iter().all(|c| c.holder_name == "Mara Silva-Costa"));

    let b_certs = h
        .certifications
        .list(CertificationFilter {
            profile_id: Some(b.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(b_certs.iter().all(|c| c.holder_name == "Tom Reyes"));

    h.drain().await;
}

#[tokio::test]
async fn changing_profile_email_overwrites_linked_account_email() {
    let mut h = Harness::new();

    let provisioned = h
        .sync
        .create_profile(profile_input("Nia", "Brandt", "nia@example.com"), None)
        .await
        .unwrap();

    h.sync
        .update_profile(
            provisioned.profile.id,
            UpdateProfile {
                email: Some("nia.brandt@example.com".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let account = h
        .accounts
        .get_by_id(provisioned.account.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.email, "nia.brandt@example.com");

    h.drain().await;
}

#[tokio::test]
async fn deleting_profile_cascades_certifications_and_user_account() {
    let mut h = Harness::new();
    let admin = h.add_admin("admin@example.com").await;

    let provisioned = h
        .sync
        .create_profile(profile_input("Omar", "Diallo", "omar@example.com"), None)
        .await
        .unwrap();
    let profile_id = provisioned.profile.id;

    h.sync
        .create_certification(
            certification_input("Forklift", Some(profile_id), None, Some(date(2027, 1, 1))),
            None,
        )
        .await
        .unwrap();
    h.sync
        .create_certification(
            certification_input("First Aid", Some(profile_id), None, Some(date(2027, 2, 1))),
            None,
        )
        .await
        .unwrap();

    // Start from a clean slate of events
    h.drain().await;

    let removal = h.sync.delete_profile(profile_id, None).await.unwrap();
    assert_eq!(removal.certifications_deleted, 2);
    assert!(removal.account_deleted);

    // No certification references the profile anymore
    let leftover = h
        .certifications
        .list(CertificationFilter {
            profile_id: Some(profile_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(leftover.is_empty());

    // The paired user-role account is gone
    assert!(h
        .accounts
        .get_by_email("omar@example.com")
        .await
        .unwrap()
        .is_none());
    assert!(h.profiles.get_by_id(profile_id).await.unwrap().is_none());

    // One deletion event per certification plus one for the profile
    h.drain().await;
    let admin_records = h
        .notifications
        .list_by_account(admin.id, Default::default())
        .await
        .unwrap();
    let cert_deletions = admin_records
        .iter()
        .filter(|n| n.kind == NotificationKind::CertificationDeleted)
        .count();
    let profile_deletions = admin_records
        .iter()
        .filter(|n| n.kind == NotificationKind::ProfileDeleted)
        .count();
    assert_eq!(cert_deletions, 2);
    assert_eq!(profile_deletions, 1);
}

#[tokio::test]
async fn deleting_profile_never_removes_admin_account() {
    let mut h = Harness::new();

    // An admin whose email will collide with the profile's
    let admin = h.add_admin("chief@example.com").await;

    let provisioned = h
        .sync
        .create_profile(profile_input("Vera", "Chief", "chief@example.com"), None)
        .await
        .unwrap();
    // The email join key linked the existing admin account
    assert_eq!(provisioned.account.id, admin.id);

    h.drain().await;
    h.sync
        .delete_profile(provisioned.profile.id, None)
        .await
        .unwrap();

    // Admin account survives the cascade
    let survivor = h
        .accounts
        .get_by_id(admin.id)
        .await
        .unwrap()
        .expect("admin account must survive profile deletion");
    assert_eq!(survivor.role, Role::Admin);
}

#[tokio::test]
async fn certification_date_invariant_rejected_before_side_effects() {
    let mut h = Harness::new();

    let profile = h
        .sync
        .create_profile(profile_input("Kim", "Soto", "kim@example.com"), None)
        .await
        .unwrap()
        .profile;
    h.drain().await;

    let result = h
        .sync
        .create_certification(
            certification_input(
                "Backwards",
                Some(profile.id),
                Some(date(2026, 5, 1)),
                Some(date(2026, 4, 1)),
            ),
            None,
        )
        .await;

    assert!(matches!(
        result,
        Err(ComplianceError::Certification(_))
    ));

    // Nothing was stored and no event went out
    let certs = h
        .certifications
        .list(CertificationFilter::default())
        .await
        .unwrap();
    assert!(certs.is_empty());
    assert_eq!(h.drain().await, 0);
}

#[tokio::test]
async fn account_email_change_propagates_to_profile() {
    let mut h = Harness::new();

    let provisioned = h
        .sync
        .create_profile(profile_input("Ana", "Keller", "ana@example.com"), None)
        .await
        .unwrap();
    h.drain().await;

    let account = h
        .sync
        .change_account_email(provisioned.account.id, "ana.keller@example.com")
        .await
        .unwrap();
    assert_eq!(account.email, "ana.keller@example.com");

    let profile = h
        .profiles
        .get_by_id(provisioned.profile.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.email, "ana.keller@example.com");
}

#[tokio::test]
async fn account_email_change_rejects_taken_address() {
    let h = Harness::new();

    let first = h
        .sync
        .create_profile(profile_input("One", "Person", "one@example.com"), None)
        .await
        .unwrap();
    h.sync
        .create_profile(profile_input("Two", "Person", "two@example.com"), None)
        .await
        .unwrap();

    let result = h
        .sync
        .change_account_email(first.account.id, "two@example.com")
        .await;
    assert!(matches!(result, Err(ComplianceError::Validation(_))));

    let result = h
        .sync
        .change_account_email(first.account.id, "not-an-email")
        .await;
    assert!(matches!(result, Err(ComplianceError::Validation(_))));
}

#[tokio::test]
async fn updating_unowned_certification_emits_no_event() {
    let mut h = Harness::new();
    h.add_admin("admin@example.com").await;

    let cert = h
        .sync
        .create_certification(
            certification_input("Site Licence", None, None, Some(date(2027, 1, 1))),
            None,
        )
        .await
        .unwrap();
    assert_eq!(cert.holder_name, "");

    assert_eq!(h.drain().await, 0);
}
