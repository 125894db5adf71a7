//! Helper functions used by the app wiring, the repos and the api layer.

use crate::{config::AppConfig, repo::sqlite_queries};
use anyhow::anyhow;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::{path::PathBuf, str::FromStr};

pub async fn setup_sqlite_db_pool(app_config: &AppConfig) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = sqlite_file_dir(&app_config.db_host) {
        tokio::fs::create_dir_all(parent).await?;
    }

    if app_config.is_prod() {
        return Ok(SqlitePool::connect_with(
            SqliteConnectOptions::from_str(&app_config.db_host)?
                .pragma("key", app_config.db_pass_encrypt.clone())
                .pragma("cipher_page_size", "1024")
                .pragma("kdf_iter", "64000")
                .pragma("cipher_hmac_algorithm", "HMAC_SHA1")
                .pragma("cipher_kdf_algorithm", "PBKDF2_HMAC_SHA1")
                .journal_mode(SqliteJournalMode::Delete),
        )
        .await?);
    }

    Ok(SqlitePool::connect_with(SqliteConnectOptions::from_str(&app_config.db_host)?).await?)
}

/// Single connection pool over a private in-memory database
pub async fn setup_in_memory_db_pool() -> anyhow::Result<SqlitePool> {
    Ok(SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
        .await?)
}

pub async fn run_migrations(db_pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::raw_sql(sqlite_queries::SCHEMA)
        .execute(db_pool)
        .await
        .map(|_| ())
        .map_err(|e| anyhow!("failed to apply schema: {e}"))
}

fn sqlite_file_dir(db_host: &str) -> Option<PathBuf> {
    let path = db_host
        .strip_prefix("sqlite://")
        .or_else(|| db_host.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;

    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }

    PathBuf::from(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.to_path_buf())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("password couldn't be hashed: {e}"))
}

pub fn verify_password(password: &str, password_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| anyhow!("stored password hash is invalid: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Calendar day of "now" in the user's timezone
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Write-path timestamp, fixed width so stored values sort lexicographically
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("secreto123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secreto123", &hash).unwrap());
        assert!(!verify_password("otro", &hash).unwrap());
        assert!(verify_password("secreto123", "not-a-hash").is_err());
    }

    #[test]
    fn test_sqlite_file_dir() {
        assert_eq!(
            sqlite_file_dir("sqlite:data/pet_care.db?mode=rwc"),
            Some(PathBuf::from("data"))
        );
        assert_eq!(sqlite_file_dir("sqlite::memory:"), None);
        assert_eq!(sqlite_file_dir("sqlite:pet_care.db"), None);
    }

    #[test]
    fn test_now_timestamp_is_fixed_width() {
        let stamp = now_timestamp();

        assert_eq!(stamp.len(), "2024-01-01T00:00:00.000000Z".len());
        assert!(stamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = setup_in_memory_db_pool().await.unwrap();

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }
}
