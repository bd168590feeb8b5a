//! Integration tests for the expiry scans: exact day-granular thresholds,
//! the at-most-once expired notice, per-item fault isolation, and channel
//! divergence under forced delivery failure.

mod common;

use common::{certification_input, date, profile_input, Harness};
use domain_certifications::{Certification, CertificationRepository, CreateCertification};
use domain_notifications::{NotificationFilter, NotificationKind, NotificationRepository};
use domain_profiles::{Profile, ProfileRepository};

/// A certification expiring in exactly 30 days fires exactly one
/// approaching-expiry event, and nothing on the adjacent days.
#[tokio::test]
async fn threshold_fires_on_exact_day_only() {
    let mut h = Harness::new();
    let admin = h.add_admin("admin@example.com").await;

    let profile = h
        .sync
        .create_profile(profile_input("Rhea", "Vance", "rhea@example.com"), None)
        .await
        .unwrap()
        .profile;
    h.sync
        .create_certification(
            certification_input("Forklift", Some(profile.id), None, Some(date(2026, 3, 2))),
            None,
        )
        .await
        .unwrap();
    h.drain().await;

    // 2026-01-31 is exactly 30 days before 2026-03-02
    let outcome = h.scanner.run_approaching_scan(date(2026, 1, 31)).await;
    assert_eq!(outcome.matched, 1);
    assert_eq!(outcome.notified, 1);

    let admin_reminders = h
        .notifications
        .list_by_account(
            admin.id,
            NotificationFilter {
                kind: Some(NotificationKind::ExpiryApproaching),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(admin_reminders.len(), 1);
    assert!(admin_reminders[0].message.contains("30 day(s)"));

    // 29 and 31 days out: silence
    let outcome = h.scanner.run_approaching_scan(date(2026, 2, 1)).await;
    assert_eq!(outcome.notified, 0);
    let outcome = h.scanner.run_approaching_scan(date(2026, 1, 30)).await;
    assert_eq!(outcome.notified, 0);

    let admin_reminders = h
        .notifications
        .list_by_account(
            admin.id,
            NotificationFilter {
                kind: Some(NotificationKind::ExpiryApproaching),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(admin_reminders.len(), 1);
}

#[tokio::test]
async fn every_threshold_matches_and_off_threshold_days_do_not() {
    let h = Harness::new();

    let profile = h
        .sync
        .create_profile(profile_input("Jun", "Park", "jun@example.com"), None)
        .await
        .unwrap()
        .profile;

    let today = date(2026, 6, 1);
    for days in [60, 30, 14, 7, 3, 1, 45, 2] {
        h.sync
            .create_certification(
                certification_input(
                    &format!("Cert-{}", days),
                    Some(profile.id),
                    None,
                    Some(today + chrono::Duration::days(days)),
                ),
                None,
            )
            .await
            .unwrap();
    }

    let outcome = h.scanner.run_approaching_scan(today).await;
    assert_eq!(outcome.scanned, 8);
    // 45 and 2 are not thresholds
    assert_eq!(outcome.matched, 6);
    assert_eq!(outcome.notified, 6);
}

/// Running the expired scan twice on the same day produces zero additional
/// events the second time: the persisted marker makes the notice one-shot.
#[tokio::test]
async fn expired_notice_is_sent_at_most_once() {
    let mut h = Harness::new();
    let admin = h.add_admin("admin@example.com").await;

    let profile = h
        .sync
        .create_profile(profile_input("Ivo", "Maartens", "ivo@example.com"), None)
        .await
        .unwrap()
        .profile;
    let cert = h
        .sync
        .create_certification(
            certification_input(
                "Forklift",
                Some(profile.id),
                Some(date(2024, 6, 3)),
                Some(date(2026, 6, 3)),
            ),
            None,
        )
        .await
        .unwrap();
    h.drain().await;

    // Two days past expiry, no marker yet
    let today = date(2026, 6, 5);
    let outcome = h.scanner.run_expired_scan(today).await;
    assert_eq!(outcome.matched, 1);
    assert_eq!(outcome.notified, 1);

    let marked = h
        .certifications
        .get_by_id(cert.id)
        .await
        .unwrap()
        .unwrap();
    assert!(marked.expiry_notified_at.is_some());

    // Same simulated day, second run: nothing new
    let outcome = h.scanner.run_expired_scan(today).await;
    assert_eq!(outcome.matched, 0);
    assert_eq!(outcome.notified, 0);

    let expired_records = h
        .notifications
        .list_by_account(
            admin.id,
            NotificationFilter {
                kind: Some(NotificationKind::Expired),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(expired_records.len(), 1);
}

/// A certification far past expiry with no marker stays silent: the bounded
/// window prefers "never notified" over "notified forever" for stale data.
#[tokio::test]
async fn expired_outside_grace_window_stays_silent() {
    let h = Harness::new();

    let profile = h
        .sync
        .create_profile(profile_input("Old", "Record", "old@example.com"), None)
        .await
        .unwrap()
        .profile;
    h.sync
        .create_certification(
            certification_input(
                "Ancient Licence",
                Some(profile.id),
                Some(date(2020, 1, 1)),
                Some(date(2026, 1, 1)),
            ),
            None,
        )
        .await
        .unwrap();

    // 31 days past expiry, well beyond the 7-day window
    let outcome = h.scanner.run_expired_scan(date(2026, 2, 1)).await;
    assert_eq!(outcome.matched, 0);
    assert_eq!(outcome.notified, 0);
}

/// One unattributable certification never aborts the scan of the rest.
#[tokio::test]
async fn scan_is_fault_isolated_per_certification() {
    let h = Harness::new();

    let profile = h
        .sync
        .create_profile(profile_input("Eva", "Lind", "eva@example.com"), None)
        .await
        .unwrap()
        .profile;

    let today = date(2026, 9, 1);

    // Orphan: no owning profile
    h.certifications
        .create(Certification::new(
            certification_input("Orphan", None, None, Some(today + chrono::Duration::days(7))),
            String::new(),
        ))
        .await
        .unwrap();

    // Owner vanished from the store
    h.certifications
        .create(Certification::new(
            CreateCertification {
                profile_id: Some(uuid::Uuid::now_v7()),
                ..certification_input(
                    "Ghost owner",
                    None,
                    None,
                    Some(today + chrono::Duration::days(7)),
                )
            },
            "Ghost".to_string(),
        ))
        .await
        .unwrap();

    // Healthy record
    h.sync
        .create_certification(
            certification_input(
                "Healthy",
                Some(profile.id),
                None,
                Some(today + chrono::Duration::days(7)),
            ),
            None,
        )
        .await
        .unwrap();

    let outcome = h.scanner.run_approaching_scan(today).await;
    assert_eq!(outcome.matched, 3);
    assert_eq!(outcome.skipped, 2);
    assert_eq!(outcome.notified, 1);
}

/// A profile whose email cannot be resolved is skipped and logged, not fatal.
#[tokio::test]
async fn profile_without_email_is_skipped() {
    let h = Harness::new();

    let mut profile = Profile::new(
        profile_input("No", "Email", "placeholder@example.com"),
        1000,
        10101010,
    );
    profile.email = String::new();
    let profile = h.profiles.create(profile).await.unwrap();

    let today = date(2026, 9, 1);
    h.certifications
        .create(Certification::new(
            certification_input(
                "Unreachable",
                Some(profile.id),
                None,
                Some(today + chrono::Duration::days(14)),
            ),
            profile.full_name(),
        ))
        .await
        .unwrap();

    let outcome = h.scanner.run_approaching_scan(today).await;
    assert_eq!(outcome.matched, 1);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.notified, 0);
}

/// Forcing delivery failure for the subject leaves the subject's record and
/// every other recipient's record and delivery intact.
#[tokio::test]
async fn delivery_failure_for_one_recipient_does_not_spread() {
    let mut h = Harness::new();
    let admin = h.add_admin("admin@example.com").await;

    let provisioned = h
        .sync
        .create_profile(profile_input("Uma", "Devi", "uma@example.com"), None)
        .await
        .unwrap();
    h.sync
        .create_certification(
            certification_input(
                "Forklift",
                Some(provisioned.profile.id),
                None,
                Some(date(2026, 10, 1)),
            ),
            None,
        )
        .await
        .unwrap();
    h.drain().await;

    h.gateway.fail_for("uma@example.com").await;

    // 7 days before expiry
    let outcome = h.scanner.run_approaching_scan(date(2026, 9, 24)).await;
    assert_eq!(outcome.notified, 1);

    // Subject record exists despite the failed email
    let subject_records = h
        .notifications
        .list_by_account(
            provisioned.account.id,
            NotificationFilter {
                kind: Some(NotificationKind::ExpiryApproaching),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(subject_records.len(), 1);

    // Admin got both channels
    let admin_records = h
        .notifications
        .list_by_account(
            admin.id,
            NotificationFilter {
                kind: Some(NotificationKind::ExpiryApproaching),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(admin_records.len(), 1);
    assert_eq!(h.gateway.sent_to("admin@example.com").await.len(), 1);
    assert!(h.gateway.sent_to("uma@example.com").await.is_empty());
}

/// The two scans read the same certification set but write disjoint
/// notification kinds; running both on one day keeps them independent.
#[tokio::test]
async fn approaching_and_expired_scans_are_independent() {
    let mut h = Harness::new();
    let admin = h.add_admin("admin@example.com").await;

    let profile = h
        .sync
        .create_profile(profile_input("Pia", "Novak", "pia@example.com"), None)
        .await
        .unwrap()
        .profile;

    let today = date(2026, 4, 10);
    h.sync
        .create_certification(
            certification_input(
                "Approaching",
                Some(profile.id),
                None,
                Some(today + chrono::Duration::days(3)),
            ),
            None,
        )
        .await
        .unwrap();
    h.sync
        .create_certification(
            certification_input(
                "Gone",
                Some(profile.id),
                Some(date(2024, 4, 9)),
                Some(today - chrono::Duration::days(1)),
            ),
            None,
        )
        .await
        .unwrap();
    h.drain().await;

    let approaching = h.scanner.run_approaching_scan(today).await;
    let expired = h.scanner.run_expired_scan(today).await;
    assert_eq!(approaching.notified, 1);
    assert_eq!(expired.notified, 1);

    let records = h
        .notifications
        .list_by_account(admin.id, Default::default())
        .await
        .unwrap();
    let kinds: Vec<_> = records.iter().map(|n| n.kind).collect();
    assert!(kinds.contains(&NotificationKind::ExpiryApproaching));
    assert!(kinds.contains(&NotificationKind::Expired));
}
