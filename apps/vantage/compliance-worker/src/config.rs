//! Configuration for the compliance worker

use core_config::schedule::ScheduleConfig;
use core_config::FromEnv;
use database::postgres::PostgresConfig;
use domain_notifications::SmtpConfig;
use eyre::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: PostgresConfig,
    pub schedule: ScheduleConfig,
    pub smtp: SmtpConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database: <PostgresConfig as FromEnv>::from_env()?,
            schedule: <ScheduleConfig as FromEnv>::from_env()?,
            smtp: SmtpConfig::from_env(),
        })
    }
}
