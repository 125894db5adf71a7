//! Identity provider backed by the local sqlite database.
//!
//! Accounts live in `identity_account` with argon2 password hashes. After
//! too many consecutive wrong passwords the account answers
//! `auth/too-many-requests` for a lockout window; once it passes, a correct
//! password signs in and resets the counter.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, Row, SqlitePool, sqlite::SqliteRow};
use tokio::sync::watch;
use uuid::Uuid;

use super::{
    CODE_EMAIL_ALREADY_IN_USE, CODE_INVALID_EMAIL, CODE_TOO_MANY_REQUESTS, CODE_USER_DISABLED,
    CODE_USER_NOT_FOUND, CODE_WEAK_PASSWORD, CODE_WRONG_PASSWORD, IdentityProvider, ProviderError,
};
use crate::{
    consts,
    models::user_app::{Session, UserProfile},
    repo::{Collection, ImplDocumentStore, sqlite_queries},
    utils,
};

struct IdentityAccount {
    uid: String,
    email: String,
    password_hash: String,
    display_name: Option<String>,
    is_disabled: bool,
    locked_until: Option<DateTime<Utc>>,
}

impl FromRow<'_, SqliteRow> for IdentityAccount {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            uid: row.try_get("uid")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            display_name: row.try_get("display_name")?,
            is_disabled: row.try_get("is_disabled")?,
            locked_until: row.try_get("locked_until")?,
        })
    }
}

impl IdentityAccount {
    fn session(&self) -> Session {
        Session {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }

    fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

pub struct LocalIdentityProvider {
    pub db_pool: SqlitePool,
    pub store: ImplDocumentStore,
    session: watch::Sender<Option<Session>>,
    lockout: Duration,
}

impl LocalIdentityProvider {
    pub fn new(db_pool: SqlitePool, store: ImplDocumentStore) -> Self {
        let (session, _) = watch::channel(None);

        Self {
            db_pool,
            store,
            session,
            lockout: Duration::seconds(consts::SIGN_IN_LOCKOUT_SECS),
        }
    }

    /// How long an account stays locked after too many wrong passwords
    pub fn with_lockout(mut self, lockout: Duration) -> Self {
        self.lockout = lockout;
        self
    }

    async fn get_account_by_email(&self, email: &str) -> anyhow::Result<Option<IdentityAccount>> {
        Ok(
            sqlx::query_as::<_, IdentityAccount>(
                sqlite_queries::QUERY_GET_IDENTITY_ACCOUNT_BY_EMAIL,
            )
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?,
        )
    }

    pub async fn set_account_disabled(&self, email: &str, disabled: bool) -> anyhow::Result<()> {
        sqlx::query(sqlite_queries::QUERY_SET_ACCOUNT_DISABLED)
            .bind(normalize_email(email))
            .bind(disabled)
            .bind(Utc::now())
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let account = self
            .get_account_by_email(&normalize_email(email))
            .await
            .map_err(ProviderError::internal)?
            .ok_or_else(|| ProviderError::new(CODE_USER_NOT_FOUND, "no account for this email"))?;

        if account.is_disabled {
            return Err(ProviderError::new(CODE_USER_DISABLED, "account disabled"));
        }

        let now = Utc::now();
        if account.is_locked(now) {
            return Err(ProviderError::new(
                CODE_TOO_MANY_REQUESTS,
                "too many failed attempts",
            ));
        }

        let valid = utils::verify_password(password, &account.password_hash)
            .map_err(ProviderError::internal)?;

        let updated = match valid {
            true => sqlx::query(sqlite_queries::QUERY_RESET_FAILED_ATTEMPTS)
                .bind(&account.uid)
                .bind(now),
            false => sqlx::query(sqlite_queries::QUERY_REGISTER_FAILED_ATTEMPT)
                .bind(&account.uid)
                .bind(now)
                .bind(consts::MAX_FAILED_SIGN_IN_ATTEMPTS)
                .bind(now + self.lockout),
        };
        updated
            .execute(&self.db_pool)
            .await
            .map_err(|e| ProviderError::internal(e.into()))?;

        if !valid {
            return Err(ProviderError::new(CODE_WRONG_PASSWORD, "wrong password"));
        }

        let session = account.session();
        self.session.send_replace(Some(session.clone()));

        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, ProviderError> {
        let email = normalize_email(email);

        if !email.contains('@') {
            return Err(ProviderError::new(CODE_INVALID_EMAIL, "invalid email"));
        }

        if password.chars().count() < consts::MIN_PASSWORD_LEN {
            return Err(ProviderError::new(CODE_WEAK_PASSWORD, "password too short"));
        }

        let password_hash = utils::hash_password(password).map_err(ProviderError::internal)?;
        let account = IdentityAccount {
            uid: Uuid::new_v4().simple().to_string(),
            email,
            password_hash,
            display_name: Some(display_name.trim().to_string()).filter(|n| !n.is_empty()),
            is_disabled: false,
            locked_until: None,
        };

        sqlx::query(sqlite_queries::QUERY_INSERT_IDENTITY_ACCOUNT)
            .bind(&account.uid)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.display_name)
            .bind(Utc::now())
            .execute(&self.db_pool)
            .await
            .map_err(|e| {
                let duplicated = e
                    .as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation());

                match duplicated {
                    true => {
                        ProviderError::new(CODE_EMAIL_ALREADY_IN_USE, "email already registered")
                    }
                    false => ProviderError::internal(e.into()),
                }
            })?;

        let session = account.session();
        self.session.send_replace(Some(session.clone()));

        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.session.send_replace(None);
        Ok(())
    }

    async fn get_profile(&self, uid: &str) -> anyhow::Result<Option<UserProfile>> {
        self.store
            .get(Collection::Users, uid)
            .await?
            .map(|doc| serde_json::from_value(serde_json::Value::Object(doc)))
            .transpose()
            .map_err(Into::into)
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}
