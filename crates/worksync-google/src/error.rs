//! Error types for the credential exchange and the project store.

use std::fmt;
use thiserror::Error;

/// The category of an authentication error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    /// The callback's state parameter did not match the issued token.
    StateMismatch,
    /// The identity provider reported an error in the callback.
    ProviderError,
    /// The callback carried neither an error nor an authorization code.
    MissingCode,
    /// The code-for-token exchange failed or returned no identity token.
    TokenExchangeFailed,
    /// The backing auth service rejected the identity token.
    CredentialRejected,
    /// No callback arrived within the bounded wait.
    CallbackTimeout,
    /// Missing or invalid configuration (ports, paths, credentials).
    ConfigurationError,
    /// Unexpected internal state.
    InternalError,
}

impl AuthErrorCode {
    /// Returns a stable machine-readable name for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateMismatch => "state_mismatch",
            Self::ProviderError => "provider_error",
            Self::MissingCode => "missing_code",
            Self::TokenExchangeFailed => "token_exchange_failed",
            Self::CredentialRejected => "credential_rejected",
            Self::CallbackTimeout => "callback_timeout",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from the sign-in flow.
#[derive(Debug, Error)]
pub struct AuthError {
    code: AuthErrorCode,
    message: String,
}

impl AuthError {
    /// Creates a new auth error.
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates a state-mismatch error.
    pub fn state_mismatch() -> Self {
        Self::new(
            AuthErrorCode::StateMismatch,
            "callback state does not match the issued state token",
        )
    }

    /// Creates a provider-reported error.
    pub fn provider(detail: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::ProviderError, detail)
    }

    /// Creates a missing-code error.
    pub fn missing_code() -> Self {
        Self::new(
            AuthErrorCode::MissingCode,
            "no authorization code in callback",
        )
    }

    /// Creates a token-exchange error.
    pub fn token_exchange(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::TokenExchangeFailed, message)
    }

    /// Creates a credential-rejected error.
    pub fn credential_rejected(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::CredentialRejected, message)
    }

    /// Creates a callback-timeout error.
    pub fn callback_timeout() -> Self {
        Self::new(
            AuthErrorCode::CallbackTimeout,
            "no authorization callback received before the deadline",
        )
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::ConfigurationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InternalError, message)
    }

    /// Returns the error code.
    pub fn code(&self) -> AuthErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for sign-in operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// The category of a project-store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorCode {
    /// A record with the requested name already exists.
    AlreadyExists,
    /// No record with the requested name exists.
    NotFound,
    /// The store could not be reached or refused the request.
    TransportFailure,
    /// The store's response could not be parsed.
    InvalidResponse,
}

impl StoreErrorCode {
    /// Returns a stable machine-readable name for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::TransportFailure => "transport_failure",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from a project-store operation.
#[derive(Debug, Error)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
}

impl StoreError {
    /// Creates a new store error.
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an already-exists error for the given record name.
    pub fn already_exists(name: &str) -> Self {
        Self::new(
            StoreErrorCode::AlreadyExists,
            format!("project \"{name}\" already exists"),
        )
    }

    /// Creates a not-found error for the given record name.
    pub fn not_found(name: &str) -> Self {
        Self::new(
            StoreErrorCode::NotFound,
            format!("project \"{name}\" does not exist"),
        )
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::TransportFailure, message)
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::InvalidResponse, message)
    }

    /// Returns the error code.
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_codes_display() {
        assert_eq!(AuthErrorCode::StateMismatch.as_str(), "state_mismatch");
        assert_eq!(
            AuthErrorCode::TokenExchangeFailed.as_str(),
            "token_exchange_failed"
        );
    }

    #[test]
    fn auth_error_creation() {
        let err = AuthError::state_mismatch();
        assert_eq!(err.code(), AuthErrorCode::StateMismatch);
        assert!(format!("{err}").contains("state_mismatch"));
    }

    #[test]
    fn store_error_creation() {
        let err = StoreError::already_exists("Alpha");
        assert_eq!(err.code(), StoreErrorCode::AlreadyExists);
        assert!(err.message().contains("Alpha"));

        let err = StoreError::not_found("Beta");
        assert_eq!(err.code(), StoreErrorCode::NotFound);
        assert!(format!("{err}").contains("not_found"));
    }
}
