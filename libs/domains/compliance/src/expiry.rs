//! Expiry scanning.
//!
//! Walks every certification with a known expiry date, computes whole
//! calendar days until expiry, and fires reminder events at the fixed
//! thresholds. Certifications are processed one at a time and each one is a
//! self-contained unit: a bad record or a failed fan-out is logged and the
//! scan moves on, so an interrupted run simply resumes coverage on the next
//! trigger.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use domain_certifications::{Certification, CertificationRepository};
use domain_notifications::{FanoutEngine, NotificationEvent, NotificationKind};
use domain_profiles::{Profile, ProfileRepository};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Reminder thresholds in days before expiry. An exact match fires exactly
/// one approaching-expiry event for that run.
pub const APPROACHING_THRESHOLDS: [i64; 6] = [60, 30, 14, 7, 3, 1];

/// How many days past expiry a certification without an idempotency marker
/// is still eligible for its (single) expired notice.
pub const EXPIRED_GRACE_DAYS: i64 = 7;

/// Which scan produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
    Approaching,
    Expired,
}

impl ScanKind {
    fn as_str(&self) -> &'static str {
        match self {
            ScanKind::Approaching => "approaching",
            ScanKind::Expired => "expired",
        }
    }
}

/// Result of one scan run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub kind: ScanKind,
    /// Certifications with an expiry date that were examined.
    pub scanned: usize,
    /// Certifications that hit a threshold / the expired window.
    pub matched: usize,
    /// Matched certifications whose fan-out was invoked.
    pub notified: usize,
    /// Matched certifications skipped (no owner, no resolvable email).
    pub skipped: usize,
    /// Store or marker failures tolerated during the run.
    pub errors: usize,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl ScanOutcome {
    fn empty(kind: ScanKind) -> Self {
        Self {
            kind,
            scanned: 0,
            matched: 0,
            notified: 0,
            skipped: 0,
            errors: 0,
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }
}

/// Scanner over the certification set.
pub struct ExpiryScanner {
    certifications: Arc<dyn CertificationRepository>,
    profiles: Arc<dyn ProfileRepository>,
    fanout: Arc<FanoutEngine>,
}

impl ExpiryScanner {
    pub fn new(
        certifications: Arc<dyn CertificationRepository>,
        profiles: Arc<dyn ProfileRepository>,
        fanout: Arc<FanoutEngine>,
    ) -> Self {
        Self {
            certifications,
            profiles,
            fanout,
        }
    }

    /// Fire approaching-expiry reminders for certifications sitting exactly
    /// on one of the configured thresholds today.
    pub async fn run_approaching_scan(&self, today: NaiveDate) -> ScanOutcome {
        let start = std::time::Instant::now();
        let mut outcome = ScanOutcome::empty(ScanKind::Approaching);

        let certifications = match self.load(&mut outcome).await {
            Some(certifications) => certifications,
            None => {
                self.finish(&mut outcome, start);
                return outcome;
            }
        };

        for certification in certifications {
            outcome.scanned += 1;

            let Some(days) = certification.days_until_expiry(today) else {
                // list_with_expiry should not hand these out
                warn!(cert_id = %certification.id, "Certification without expiry date in scan");
                outcome.skipped += 1;
                continue;
            };

            if !APPROACHING_THRESHOLDS.contains(&days) {
                continue;
            }
            outcome.matched += 1;

            let Some(profile) = self.resolve_owner(&certification, &mut outcome).await else {
                continue;
            };

            debug!(
                cert_id = %certification.id,
                days = days,
                holder = %profile.full_name(),
                "Approaching-expiry threshold hit"
            );

            let event =
                NotificationEvent::new(NotificationKind::ExpiryApproaching, profile.id)
                    .with_certification(certification.id, certification.name.clone())
                    .with_days(days);
            self.fanout.notify(&profile, &event).await;
            outcome.notified += 1;
        }

        self.finish(&mut outcome, start);
        outcome
    }

    /// Fire the one-time expired notice for certifications past their expiry
    /// date. The persisted marker makes re-runs on the same (or any later)
    /// day produce nothing.
    pub async fn run_expired_scan(&self, today: NaiveDate) -> ScanOutcome {
        let start = std::time::Instant::now();
        let mut outcome = ScanOutcome::empty(ScanKind::Expired);

        let certifications = match self.load(&mut outcome).await {
            Some(certifications) => certifications,
            None => {
                self.finish(&mut outcome, start);
                return outcome;
            }
        };

        for certification in certifications {
            outcome.scanned += 1;

            let Some(days) = certification.days_until_expiry(today) else {
                warn!(cert_id = %certification.id, "Certification without expiry date in scan");
                outcome.skipped += 1;
                continue;
            };

            if days > 0 {
                continue;
            }

            if certification.expiry_notified_at.is_some() {
                // Already notified once; nothing to do on this or any later run
                continue;
            }

            if days < -EXPIRED_GRACE_DAYS {
                // No marker and long past expiry: the bounded window has
                // closed, so stay silent instead of notifying forever
                debug!(
                    cert_id = %certification.id,
                    days_past = -days,
                    "Expired outside the notice window; skipping"
                );
                continue;
            }
            outcome.matched += 1;

            let Some(profile) = self.resolve_owner(&certification, &mut outcome).await else {
                continue;
            };

            info!(
                cert_id = %certification.id,
                holder = %profile.full_name(),
                days_past = -days,
                "Certification expired; sending notice"
            );

            let event = NotificationEvent::new(NotificationKind::Expired, profile.id)
                .with_certification(certification.id, certification.name.clone())
                .with_days(days);
            self.fanout.notify(&profile, &event).await;
            outcome.notified += 1;

            // Persist the marker after the attempt; a failed write is logged
            // and the grace window caps how long re-notices can repeat
            if let Err(e) = self
                .certifications
                .mark_expiry_notified(certification.id, Utc::now())
                .await
            {
                error!(cert_id = %certification.id, error = %e, "Failed to persist expired-notice marker");
                outcome.errors += 1;
            }
        }

        self.finish(&mut outcome, start);
        outcome
    }

    async fn load(&self, outcome: &mut ScanOutcome) -> Option<Vec<Certification>> {
        match self.certifications.list_with_expiry().await {
            Ok(certifications) => Some(certifications),
            Err(e) => {
                // Store error: this run is lost, the next trigger recovers
                error!(error = %e, "Could not load certifications for scan");
                outcome.errors += 1;
                None
            }
        }
    }

    /// Resolve the owning profile, bumping the skip/error counters when the
    /// certification cannot be attributed to anyone.
    async fn resolve_owner(
        &self,
        certification: &Certification,
        outcome: &mut ScanOutcome,
    ) -> Option<Profile> {
        let Some(profile_id) = certification.profile_id else {
            warn!(cert_id = %certification.id, "Certification has no owning profile; skipping");
            outcome.skipped += 1;
            return None;
        };

        match self.profiles.get_by_id(profile_id).await {
            Ok(Some(profile)) => {
                if profile.email.trim().is_empty() {
                    warn!(
                        cert_id = %certification.id,
                        profile_id = %profile_id,
                        "Owning profile has no resolvable email; skipping"
                    );
                    outcome.skipped += 1;
                    return None;
                }
                Some(profile)
            }
            Ok(None) => {
                warn!(
                    cert_id = %certification.id,
                    profile_id = %profile_id,
                    "Owning profile missing; skipping"
                );
                outcome.skipped += 1;
                None
            }
            Err(e) => {
                error!(cert_id = %certification.id, error = %e, "Profile lookup failed; skipping");
                outcome.errors += 1;
                None
            }
        }
    }

    fn finish(&self, outcome: &mut ScanOutcome, start: std::time::Instant) {
        let duration = start.elapsed();
        outcome.duration_ms = duration.as_millis() as u64;

        observability::counter!("expiry_scan_runs_total", "kind" => outcome.kind.as_str())
            .increment(1);
        observability::counter!("expiry_scan_notified_total", "kind" => outcome.kind.as_str())
            .increment(outcome.notified as u64);
        observability::counter!("expiry_scan_skipped_total", "kind" => outcome.kind.as_str())
            .increment(outcome.skipped as u64);
        observability::counter!("expiry_scan_errors_total", "kind" => outcome.kind.as_str())
            .increment(outcome.errors as u64);
        observability::histogram!("expiry_scan_duration_seconds")
            .record(duration.as_secs_f64());

        info!(
            kind = outcome.kind.as_str(),
            scanned = outcome.scanned,
            matched = outcome.matched,
            notified = outcome.notified,
            skipped = outcome.skipped,
            errors = outcome.errors,
            duration_ms = outcome.duration_ms,
            "Scan complete"
        );
    }
}

/// Convenience used by the worker binary: today's date in the configured
/// timezone, as a plain calendar date.
pub fn today_in<Tz: chrono::TimeZone>(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}
