//! Compliance Worker
//!
//! Back-office service for the certification compliance platform. Runs the
//! daily expiry scans (one-shot or on a cron schedule), applies database
//! migrations, and lets an administrator provision employee profiles from
//! the command line.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::Environment;
use domain_accounts::PostgresAccountRepository;
use domain_certifications::PostgresCertificationRepository;
use domain_compliance::{today_in, ExpiryScanner, FanoutQueue, FanoutWorker, SyncEngine};
use domain_notifications::{FanoutEngine, PostgresNotificationRepository, SmtpGateway};
use domain_profiles::{CreateProfile, PostgresProfileRepository};
use eyre::{eyre, Result};
use tracing::info;

mod config;
mod runner;

use config::Config;
use runner::ComplianceRunner;

#[derive(Parser)]
#[command(name = "compliance-worker")]
#[command(about = "Run certification expiry scans and notification fan-out")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a one-shot scan and print the outcome
    Scan {
        /// Which scan to run: approaching, expired, or all
        #[arg(short, long, default_value = "all")]
        kind: String,
    },

    /// Run both scans on their cron schedules
    Schedule,

    /// Provision an employee profile (synthesizes a linked account when
    /// none exists for the email)
    Provision {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        job_title: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },

    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    let environment = Environment::from_env();
    init_tracing(&environment);

    observability::init_metrics();

    let cli = Cli::parse();

    info!("Connecting to database...");
    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre!("Database connection failed: {}", e))?;

    if let Commands::Migrate = cli.command {
        database::postgres::run_migrations::<migration::Migrator>(&db, "compliance-worker")
            .await
            .map_err(|e| eyre!("Migration failed: {}", e))?;
        return Ok(());
    }

    // Shared stack over the four collections
    let profiles = Arc::new(PostgresProfileRepository::new(db.clone()));
    let accounts = Arc::new(PostgresAccountRepository::new(db.clone()));
    let certifications = Arc::new(PostgresCertificationRepository::new(db.clone()));
    let notifications = Arc::new(PostgresNotificationRepository::new(db.clone()));

    let gateway = Arc::new(
        SmtpGateway::new(config.smtp.clone())
            .map_err(|e| eyre!("SMTP gateway setup failed: {}", e))?,
    );
    let fanout = Arc::new(
        FanoutEngine::new(notifications, accounts.clone(), gateway)
            .map_err(|e| eyre!("Fan-out engine setup failed: {}", e))?,
    );

    let scanner = Arc::new(ExpiryScanner::new(
        certifications.clone(),
        profiles.clone(),
        fanout.clone(),
    ));

    match cli.command {
        Commands::Scan { kind } => {
            let tz = config.schedule.tz()?;
            let today = today_in(&tz);

            match kind.as_str() {
                "approaching" => {
                    let outcome = scanner.run_approaching_scan(today).await;
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
                "expired" => {
                    let outcome = scanner.run_expired_scan(today).await;
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
                "all" => {
                    let approaching = scanner.run_approaching_scan(today).await;
                    let expired = scanner.run_expired_scan(today).await;
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "approaching": approaching,
                            "expired": expired,
                        }))?
                    );
                }
                other => return Err(eyre!("Unknown scan kind '{}'", other)),
            }
        }

        Commands::Schedule => {
            let runner = ComplianceRunner::new(scanner, config);
            runner.run_scheduled().await?;
        }

        Commands::Provision {
            first_name,
            last_name,
            email,
            job_title,
            department,
        } => {
            let (queue, rx) = FanoutQueue::bounded(64);
            let mut worker = FanoutWorker::new(rx, fanout);
            let sync = SyncEngine::new(profiles, accounts, certifications, queue);

            let provisioned = sync
                .create_profile(
                    CreateProfile {
                        first_name,
                        last_name,
                        email,
                        job_title,
                        department,
                        start_date: None,
                        contact: Default::default(),
                        address: Default::default(),
                        emergency_contact: None,
                    },
                    None,
                )
                .await
                .map_err(|e| eyre!("Provisioning failed: {}", e))?;

            // Flush the enqueued creation/credentials events before exiting
            worker.process_pending().await;

            info!(
                profile_id = %provisioned.profile.id,
                vtid = provisioned.profile.vtid,
                credentials_issued = provisioned.credentials_issued,
                "Provisioned profile"
            );
            println!("{}", serde_json::to_string_pretty(&provisioned.profile)?);
        }

        Commands::Migrate => unreachable!(),
    }

    Ok(())
}
