pub mod identity;
pub mod storage;

use crate::models::user_app::{Session, UserProfile};
use async_trait::async_trait;
use derive_more::{Display, Error};
use std::sync::Arc;
use tokio::sync::watch;

pub const CODE_EMAIL_ALREADY_IN_USE: &str = "auth/email-already-in-use";
pub const CODE_WEAK_PASSWORD: &str = "auth/weak-password";
pub const CODE_INVALID_EMAIL: &str = "auth/invalid-email";
pub const CODE_USER_NOT_FOUND: &str = "auth/user-not-found";
pub const CODE_WRONG_PASSWORD: &str = "auth/wrong-password";
pub const CODE_INVALID_CREDENTIAL: &str = "auth/invalid-credential";
pub const CODE_TOO_MANY_REQUESTS: &str = "auth/too-many-requests";
pub const CODE_USER_DISABLED: &str = "auth/user-disabled";
pub const CODE_OPERATION_NOT_ALLOWED: &str = "auth/operation-not-allowed";
pub const CODE_NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";
pub const CODE_INTERNAL_ERROR: &str = "auth/internal-error";

/// Failure reported by an identity provider, identified by its code
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("{code}: {message}")]
pub struct ProviderError {
    #[error(not(source))]
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::new(CODE_INTERNAL_ERROR, format!("{err:#}"))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Extended profile of an identity, `None` when it was never stored
    async fn get_profile(&self, uid: &str) -> anyhow::Result<Option<UserProfile>>;

    /// Current identity, updated on every sign-in and sign-out
    fn session_changes(&self) -> watch::Receiver<Option<Session>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `body` at `path` and returns its retrieval URL
    async fn upload(&self, path: &str, body: Vec<u8>) -> anyhow::Result<String>;

    async fn delete(&self, path: &str) -> anyhow::Result<()>;
}

pub type ImplIdentityProvider = Arc<dyn IdentityProvider>;
pub type ImplBlobStorage = Arc<dyn BlobStorage>;
