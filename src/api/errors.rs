use derive_more::{Display, Error};

use crate::services::{self, ProviderError};

/// Sign-in and sign-up failures, rendered as the message shown to the user.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[display("Este correo electrónico ya está registrado")]
    EmailAlreadyInUse,
    #[display("La contraseña debe tener al menos 6 caracteres")]
    WeakPassword,
    #[display("Correo electrónico inválido")]
    InvalidEmail,
    #[display("No existe una cuenta con este correo electrónico")]
    UserNotFound,
    #[display("Contraseña incorrecta")]
    WrongPassword,
    #[display("Credenciales inválidas")]
    InvalidCredential,
    #[display("Demasiados intentos fallidos. Intenta más tarde")]
    TooManyRequests,
    #[display("Esta cuenta ha sido deshabilitada")]
    UserDisabled,
    #[display("Operación no permitida")]
    OperationNotAllowed,
    #[display("Error de conexión. Verifica tu internet")]
    NetworkRequestFailed,
    #[display("Ha ocurrido un error. Inténtalo de nuevo.")]
    Unknown(#[error(not(source))] String),
}

impl AuthError {
    pub fn from_code(code: &str) -> Self {
        match code {
            services::CODE_EMAIL_ALREADY_IN_USE => AuthError::EmailAlreadyInUse,
            services::CODE_WEAK_PASSWORD => AuthError::WeakPassword,
            services::CODE_INVALID_EMAIL => AuthError::InvalidEmail,
            services::CODE_USER_NOT_FOUND => AuthError::UserNotFound,
            services::CODE_WRONG_PASSWORD => AuthError::WrongPassword,
            services::CODE_INVALID_CREDENTIAL => AuthError::InvalidCredential,
            services::CODE_TOO_MANY_REQUESTS => AuthError::TooManyRequests,
            services::CODE_USER_DISABLED => AuthError::UserDisabled,
            services::CODE_OPERATION_NOT_ALLOWED => AuthError::OperationNotAllowed,
            services::CODE_NETWORK_REQUEST_FAILED => AuthError::NetworkRequestFailed,
            other => AuthError::Unknown(other.to_string()),
        }
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        tracing::warn!("identity provider error: {} {}", err.code, err.message);
        AuthError::from_code(&err.code)
    }
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    #[display("Debes iniciar sesión para continuar")]
    Unauthorized,
    FormInputValueError(#[error(not(source))] String),
    #[display("El registro no existe")]
    NotFound,
    #[display("No tienes permiso para modificar este registro")]
    NotOwner,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_have_spanish_messages() {
        let err = AuthError::from(ProviderError::new(
            services::CODE_EMAIL_ALREADY_IN_USE,
            "EMAIL_EXISTS",
        ));

        assert_eq!(err, AuthError::EmailAlreadyInUse);
        assert_eq!(err.to_string(), "Este correo electrónico ya está registrado");
        assert_eq!(
            AuthError::from_code(services::CODE_NETWORK_REQUEST_FAILED).to_string(),
            "Error de conexión. Verifica tu internet"
        );
    }

    #[test]
    fn test_unknown_code_keeps_generic_message() {
        let err = AuthError::from_code("auth/quota-exceeded");

        assert_eq!(err, AuthError::Unknown("auth/quota-exceeded".into()));
        assert_eq!(err.to_string(), "Ha ocurrido un error. Inténtalo de nuevo.");
    }

    #[test]
    fn test_form_error_shows_its_message() {
        let err = UserError::FormInputValueError("Correo inválido".into());

        assert_eq!(err.to_string(), "Correo inválido");
    }
}
