//! # User API Module
//!
//! Registration, sign-in and sign-out flows on top of the identity provider,
//! plus the extended profile stored at `users/{uid}`.

use serde::Serialize;

use super::{
    errors::{AuthError, UserError},
    mutation::MutationGateway,
};
use crate::{
    consts, metric,
    models::user_app::{Session, UserProfile},
    repo::Collection,
    services::ImplIdentityProvider,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDocument<'a> {
    email: &'a str,
    display_name: &'a str,
    location: &'a str,
}

/// Registration form as typed by the user
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub location: String,
}

impl RegisterRequest {
    /// Checks performed before anything reaches the identity provider
    pub fn validate(&self) -> Result<(), UserError> {
        if self.password.chars().count() < consts::MIN_PASSWORD_LEN {
            return Err(UserError::FormInputValueError(
                "La contraseña debe tener al menos 6 caracteres".into(),
            ));
        }

        if !self.email.contains('@') {
            return Err(UserError::FormInputValueError(
                "Ingresa un correo electrónico válido".into(),
            ));
        }

        if self.location.trim().is_empty() {
            return Err(UserError::FormInputValueError(
                "Por favor selecciona una ubicación".into(),
            ));
        }

        if self.name.trim().chars().count() < consts::MIN_DISPLAY_NAME_LEN {
            return Err(UserError::FormInputValueError(
                "El nombre debe tener al menos 2 caracteres".into(),
            ));
        }

        Ok(())
    }
}

/// Creates the identity and its profile document.
///
/// Errors are either a [`UserError`] (rejected locally) or an [`AuthError`]
/// (rejected by the provider).
pub async fn register_user(
    request: RegisterRequest,
    identity: &ImplIdentityProvider,
    gateway: &MutationGateway,
) -> anyhow::Result<Session> {
    request.validate()?;

    let _span = logfire::span!("register_user").entered();

    let email = request.email.trim();
    let name = request.name.trim();

    let session = match identity.sign_up(email, &request.password, name).await {
        Ok(session) => session,
        Err(err) => {
            metric::incr_auth_statds("sign_up_failed");
            return Err(AuthError::from(err).into());
        }
    };

    let profile = ProfileDocument {
        email: &session.email,
        display_name: name,
        location: request.location.trim(),
    };
    gateway
        .put(&session, Collection::Users, &session.uid, &profile)
        .await?;

    metric::incr_auth_statds("sign_up");
    tracing::info!("registered identity {}", session.uid);

    Ok(session)
}

pub async fn login_user(
    email: &str,
    password: &str,
    identity: &ImplIdentityProvider,
) -> Result<Session, AuthError> {
    match identity.sign_in(email.trim(), password).await {
        Ok(session) => {
            metric::incr_auth_statds("sign_in");
            Ok(session)
        }
        Err(err) => {
            metric::incr_auth_statds("sign_in_failed");
            Err(err.into())
        }
    }
}

/// Best effort: a failing sign-out is only logged
pub async fn logout_user(identity: &ImplIdentityProvider) {
    match identity.sign_out().await {
        Ok(()) => metric::incr_auth_statds("sign_out"),
        Err(err) => {
            metric::incr_auth_statds("sign_out_failed");
            tracing::warn!("sign out failed: {err}");
        }
    }
}

pub async fn get_user_profile(
    uid: &str,
    identity: &ImplIdentityProvider,
) -> anyhow::Result<Option<UserProfile>> {
    identity.get_profile(uid).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repo::{ImplDocumentStore, memory::InMemoryDocumentStore},
        services::{self, MockIdentityProvider, ProviderError},
    };
    use std::sync::Arc;

    fn request(email: &str, password: &str, name: &str, location: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            location: location.into(),
        }
    }

    fn gateway() -> (ImplDocumentStore, MutationGateway) {
        let store: ImplDocumentStore = Arc::new(InMemoryDocumentStore::new());
        (store.clone(), MutationGateway::new(store))
    }

    fn local_error(err: &anyhow::Error) -> Option<String> {
        match err.downcast_ref::<UserError>() {
            Some(UserError::FormInputValueError(msg)) => Some(msg.clone()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_short_password_fails_before_provider_call() {
        let mut mock_identity = MockIdentityProvider::new();
        mock_identity.expect_sign_up().never();
        let identity: ImplIdentityProvider = Arc::new(mock_identity);
        let (_, gateway) = gateway();

        let err = register_user(
            request("ana@correo.com", "1234", "Ana", "Guadalajara"),
            &identity,
            &gateway,
        )
        .await
        .unwrap_err();

        assert_eq!(
            local_error(&err).as_deref(),
            Some("La contraseña debe tener al menos 6 caracteres")
        );
    }

    #[test]
    fn test_register_request_validation() {
        let cases = [
            (
                request("ana.correo.com", "secreto", "Ana", "Guadalajara"),
                "Ingresa un correo electrónico válido",
            ),
            (
                request("ana@correo.com", "secreto", "Ana", "  "),
                "Por favor selecciona una ubicación",
            ),
            (
                request("ana@correo.com", "secreto", " A ", "Guadalajara"),
                "El nombre debe tener al menos 2 caracteres",
            ),
        ];

        for (req, expected) in cases {
            assert_eq!(
                req.validate(),
                Err(UserError::FormInputValueError(expected.into()))
            );
        }

        assert!(
            request("ana@correo.com", "secreto", "Ana", "Guadalajara")
                .validate()
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_register_stores_profile() {
        let mut mock_identity = MockIdentityProvider::new();
        mock_identity
            .expect_sign_up()
            .withf(|email, _, name| email == "ana@correo.com" && name == "Ana")
            .times(1)
            .returning(|email, _, name| {
                Ok(Session {
                    uid: "uid-ana".into(),
                    email: email.into(),
                    display_name: Some(name.into()),
                })
            });
        let identity: ImplIdentityProvider = Arc::new(mock_identity);
        let (store, gateway) = gateway();

        let session = register_user(
            request(" ana@correo.com ", "secreto", " Ana ", "Guadalajara"),
            &identity,
            &gateway,
        )
        .await
        .unwrap();
        assert_eq!(session.uid, "uid-ana");

        let doc = store
            .get(Collection::Users, "uid-ana")
            .await
            .unwrap()
            .unwrap();
        let profile: UserProfile = serde_json::from_value(doc.into()).unwrap();
        assert_eq!(profile.uid, "uid-ana");
        assert_eq!(profile.display_name, "Ana");
        assert_eq!(profile.location, "Guadalajara");
    }

    #[tokio::test]
    async fn test_provider_codes_map_to_auth_errors() {
        let mut mock_identity = MockIdentityProvider::new();
        mock_identity.expect_sign_up().returning(|_, _, _| {
            Err(ProviderError::new(
                services::CODE_EMAIL_ALREADY_IN_USE,
                "EMAIL_EXISTS",
            ))
        });
        mock_identity.expect_sign_in().returning(|_, _| {
            Err(ProviderError::new(
                services::CODE_TOO_MANY_REQUESTS,
                "TOO_MANY_ATTEMPTS",
            ))
        });
        let identity: ImplIdentityProvider = Arc::new(mock_identity);
        let (store, gateway) = gateway();

        let err = register_user(
            request("ana@correo.com", "secreto", "Ana", "Guadalajara"),
            &identity,
            &gateway,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<AuthError>(),
            Some(&AuthError::EmailAlreadyInUse)
        );
        assert!(
            store
                .query(Collection::Users, &crate::repo::Query::new())
                .await
                .unwrap()
                .is_empty()
        );

        let err = login_user("ana@correo.com", "secreto", &identity)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::TooManyRequests);
    }

    #[tokio::test]
    async fn test_logout_swallows_provider_errors() {
        let mut mock_identity = MockIdentityProvider::new();
        mock_identity.expect_sign_out().times(1).returning(|| {
            Err(ProviderError::new(
                services::CODE_NETWORK_REQUEST_FAILED,
                "offline",
            ))
        });
        let identity: ImplIdentityProvider = Arc::new(mock_identity);

        logout_user(&identity).await;
    }
}
