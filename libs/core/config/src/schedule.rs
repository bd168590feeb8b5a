use std::str::FromStr;

use crate::{env_or_default, ConfigError, FromEnv};

/// Cron cadence and timezone for the recurring compliance scans.
///
/// Cron expressions use the six-field form (seconds first). Both scans default
/// to early morning so reminders land before the workday starts.
#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    /// Cron expression for the approaching-expiry scan.
    pub approaching_cron: String,
    /// Cron expression for the expired scan.
    pub expired_cron: String,
    /// IANA timezone name the cron expressions are evaluated in.
    pub timezone: String,
}

impl ScheduleConfig {
    /// Parse the configured timezone name.
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        chrono_tz::Tz::from_str(&self.timezone).map_err(|e| ConfigError::ParseError {
            key: "SCAN_TIMEZONE".to_string(),
            details: format!("{}", e),
        })
    }
}

impl FromEnv for ScheduleConfig {
    /// Reads from environment variables with defaults:
    /// - SCAN_APPROACHING_CRON: daily at 06:00 ("0 0 6 * * *")
    /// - SCAN_EXPIRED_CRON: daily at 06:30 ("0 30 6 * * *")
    /// - SCAN_TIMEZONE: UTC
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            approaching_cron: env_or_default("SCAN_APPROACHING_CRON", "0 0 6 * * *"),
            expired_cron: env_or_default("SCAN_EXPIRED_CRON", "0 30 6 * * *"),
            timezone: env_or_default("SCAN_TIMEZONE", "UTC"),
        };

        // Fail fast on an unparseable timezone rather than at first trigger
        config.tz()?;

        Ok(config)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            approaching_cron: "0 0 6 * * *".to_string(),
            expired_cron: "0 30 6 * * *".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}
