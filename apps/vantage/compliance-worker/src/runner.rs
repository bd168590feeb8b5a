//! Scheduled execution of the expiry scans.
//!
//! Two independent cron jobs (approaching / expired) in the configured
//! timezone. They share nothing but the certification set, which both only
//! read, so they need no mutual exclusion.

use std::sync::Arc;

use chrono_tz::Tz;
use domain_compliance::{today_in, ExpiryScanner};
use eyre::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::Config;

pub struct ComplianceRunner {
    scanner: Arc<ExpiryScanner>,
    config: Config,
}

impl ComplianceRunner {
    pub fn new(scanner: Arc<ExpiryScanner>, config: Config) -> Self {
        Self { scanner, config }
    }

    /// Run as a scheduled service; never returns under normal operation.
    pub async fn run_scheduled(&self) -> Result<()> {
        let tz: Tz = self.config.schedule.tz()?;

        info!(
            approaching = %self.config.schedule.approaching_cron,
            expired = %self.config.schedule.expired_cron,
            timezone = %tz,
            "Starting scheduled compliance scans"
        );

        let sched = JobScheduler::new().await?;

        let scanner = self.scanner.clone();
        let approaching = Job::new_async_tz(
            self.config.schedule.approaching_cron.as_str(),
            tz,
            move |_uuid, _l| {
                let scanner = scanner.clone();
                Box::pin(async move {
                    info!("Running scheduled approaching-expiry scan");
                    let outcome = scanner.run_approaching_scan(today_in(&tz)).await;
                    if outcome.errors > 0 {
                        error!(errors = outcome.errors, "Approaching scan finished with errors");
                    }
                })
            },
        )?;
        sched.add(approaching).await?;

        let scanner = self.scanner.clone();
        let expired = Job::new_async_tz(
            self.config.schedule.expired_cron.as_str(),
            tz,
            move |_uuid, _l| {
                let scanner = scanner.clone();
                Box::pin(async move {
                    info!("Running scheduled expired scan");
                    let outcome = scanner.run_expired_scan(today_in(&tz)).await;
                    if outcome.errors > 0 {
                        error!(errors = outcome.errors, "Expired scan finished with errors");
                    }
                })
            },
        )?;
        sched.add(expired).await?;

        sched.start().await?;

        info!("Scheduler started, waiting for triggers...");
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
        }
    }
}
