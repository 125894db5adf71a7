//! # Session provider
//!
//! Follows the identity provider and publishes a [`SessionState`]:
//!
//! ```text
//! Loading ─┬─> Authenticated { profile: Pending } ──> Authenticated { profile: Loaded(..) }
//!          └─> Unauthenticated
//! ```
//!
//! The profile is fetched once per sign-in. A failed fetch is not retried, it
//! yields `Loaded(None)` while the session stays authenticated. An identity
//! change during the fetch is published right away and the fetch is dropped.

use tokio::{sync::watch, task::JoinHandle};

use super::errors::UserError;
use crate::{
    models::user_app::{Session, UserProfile},
    services::ImplIdentityProvider,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileState {
    Pending,
    Loaded(Option<UserProfile>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Unauthenticated,
    Authenticated {
        session: Session,
        profile: ProfileState,
    },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn uid(&self) -> Option<&str> {
        self.session().map(|session| session.uid.as_str())
    }

    /// Loaded profile, `None` while pending or when it could not be read
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated {
                profile: ProfileState::Loaded(profile),
                ..
            } => profile.as_ref(),
            _ => None,
        }
    }
}

pub struct SessionProvider {
    state: watch::Sender<SessionState>,
    task: JoinHandle<()>,
}

impl SessionProvider {
    /// Starts following `identity`. Must be called inside a tokio runtime.
    pub fn start(identity: ImplIdentityProvider) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        let task = tokio::spawn(follow_identity(identity, state.clone()));

        Self { state, task }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn changes(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    pub fn require_session(&self) -> Result<Session, UserError> {
        self.current_session().ok_or(UserError::Unauthorized)
    }

    /// Waits until the first identity event was processed
    pub async fn resolved(&self) -> SessionState {
        let mut changes = self.changes();
        match changes
            .wait_for(|state| *state != SessionState::Loading)
            .await
        {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Waits until the profile of the current sign-in was fetched
    pub async fn profile_loaded(&self) -> SessionState {
        let mut changes = self.changes();
        match changes
            .wait_for(|state| {
                !matches!(
                    state,
                    SessionState::Loading
                        | SessionState::Authenticated {
                            profile: ProfileState::Pending,
                            ..
                        }
                )
            })
            .await
        {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn follow_identity(identity: ImplIdentityProvider, state: watch::Sender<SessionState>) {
    let mut identity_changes = identity.session_changes();

    loop {
        let current = identity_changes.borrow_and_update().clone();

        match current {
            None => {
                state.send_replace(SessionState::Unauthenticated);
            }
            Some(session) => {
                let uid = session.uid.clone();
                state.send_replace(SessionState::Authenticated {
                    session,
                    profile: ProfileState::Pending,
                });

                // a new identity event drops the fetch of the previous one
                let fetched = tokio::select! {
                    biased;
                    changed = identity_changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                    fetched = identity.get_profile(&uid) => fetched,
                };

                let profile = match fetched {
                    Ok(profile) => profile,
                    Err(err) => {
                        tracing::warn!("failed to get profile of {uid}: {err:#}");
                        None
                    }
                };

                state.send_if_modified(|current| match current {
                    SessionState::Authenticated {
                        session,
                        profile: pending @ ProfileState::Pending,
                    } if session.uid == uid => {
                        *pending = ProfileState::Loaded(profile);
                        true
                    }
                    _ => false,
                });
            }
        }

        if identity_changes.changed().await.is_err() {
            break;
        }
    }
}
