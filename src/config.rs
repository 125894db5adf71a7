//! Application configuration loaded from the environment.
//!
//! The configuration is read once at start-up and handed to
//! [`crate::app::AppState::build`]; nothing in the crate reads it from a
//! global.
//!
//! # Security Notes
//! - Sensitive fields are marked and must never be logged
//! - Production deployments should feed them from a secret manager

use anyhow::Context;
use chrono_tz::Tz;
use envconfig::Envconfig;
use log::LevelFilter;

/// Application configuration.
#[derive(Envconfig, Clone, Debug)]
pub struct AppConfig {
    /// Environment name (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// sqlite connection string (NON-SENSITIVE)
    #[envconfig(default = "sqlite:data/pet_care.db?mode=rwc")]
    pub db_host: String,

    /// 🔒 SENSITIVE: key used by sqlcipher to encrypt the sqlite file in prod
    #[envconfig(default = "")]
    pub db_pass_encrypt: String,

    /// S3 bucket for pet pictures; local files are used when unset
    pub storage_bucket: Option<String>,

    /// Directory for local blobs (NON-SENSITIVE)
    #[envconfig(default = "data/blobs")]
    pub storage_local_dir: String,

    /// Prefix of the retrieval URL handed out for local blobs
    #[envconfig(default = "file://data/blobs")]
    pub storage_public_base_url: String,

    /// AWS region for the S3 client
    #[envconfig(default = "us-east-2")]
    pub aws_region_name: String,

    /// IANA timezone used to decide which calendar day is "today"
    #[envconfig(default = "UTC")]
    pub user_timezone: String,

    /// Size of the dashboard "next days" window
    #[envconfig(default = "7")]
    pub dashboard_window_days: i64,

    /// 🔒 SENSITIVE: logfire write token, logs stay local when unset
    pub logfire_token: Option<String>,

    /// Level of the local logger: off, error, warn, info, debug or trace
    #[envconfig(default = "info")]
    pub log_level: String,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    /// Parses the configured timezone
    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.user_timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid USER_TIMEZONE {}", self.user_timezone))
    }

    /// Parses the configured local log level
    pub fn log_level(&self) -> anyhow::Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .with_context(|| format!("invalid LOG_LEVEL {}", self.log_level))
    }
}
