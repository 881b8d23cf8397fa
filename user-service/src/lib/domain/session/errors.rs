use auth::AuthenticationError;
use auth::PasswordError;
use auth::TokenError;
use thiserror::Error;

use crate::user::errors::EmailError;
use crate::user::errors::NameError;
use crate::user::errors::PhoneNumberError;
use crate::user::errors::UserIdError;

/// Failures reported by a [`CredentialStore`](super::ports::CredentialStore).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record to update or revoke does not exist (or is no longer active)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend could not be reached or did not answer in time
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Top-level error for all session and profile operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token is expired")]
    Expired,

    #[error("Refresh token not found or already revoked")]
    TokenNotFound,

    #[error("User not found: {0}")]
    NotFound(String),

    // Transient, the only class a caller may retry
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => SessionError::AlreadyExists(what),
            StoreError::NotFound(what) => SessionError::NotFound(what),
            StoreError::Unavailable(msg) => SessionError::Unavailable(msg),
            StoreError::Database(msg) => SessionError::Internal(msg),
        }
    }
}

impl From<AuthenticationError> for SessionError {
    fn from(err: AuthenticationError) -> Self {
        match err {
            AuthenticationError::WrongTokenKind { .. } => {
                SessionError::InvalidToken("wrong token type".to_string())
            }
            AuthenticationError::TokenError(e) => e.into(),
            AuthenticationError::PasswordError(e) => e.into(),
        }
    }
}

impl From<TokenError> for SessionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => SessionError::Expired,
            TokenError::EncodingFailed(msg) => SessionError::Internal(msg),
            other => SessionError::InvalidToken(other.to_string()),
        }
    }
}

impl From<PasswordError> for SessionError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooLong { .. } => SessionError::InvalidInput(err.to_string()),
            other => SessionError::Internal(other.to_string()),
        }
    }
}

impl From<UserIdError> for SessionError {
    fn from(err: UserIdError) -> Self {
        SessionError::InvalidInput(err.to_string())
    }
}

impl From<NameError> for SessionError {
    fn from(err: NameError) -> Self {
        SessionError::InvalidInput(err.to_string())
    }
}

impl From<PhoneNumberError> for SessionError {
    fn from(err: PhoneNumberError) -> Self {
        SessionError::InvalidInput(err.to_string())
    }
}

impl From<EmailError> for SessionError {
    fn from(err: EmailError) -> Self {
        SessionError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use auth::TokenKind;

    use super::*;

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            SessionError::from(StoreError::Conflict("+1000".to_string())),
            SessionError::AlreadyExists("+1000".to_string())
        );
        assert!(matches!(
            SessionError::from(StoreError::Unavailable("down".to_string())),
            SessionError::Unavailable(_)
        ));
        assert!(matches!(
            SessionError::from(StoreError::Database("boom".to_string())),
            SessionError::Internal(_)
        ));
    }

    #[test]
    fn test_token_error_mapping() {
        assert_eq!(SessionError::from(TokenError::Expired), SessionError::Expired);
        assert!(matches!(
            SessionError::from(TokenError::InvalidSignature),
            SessionError::InvalidToken(_)
        ));
        assert!(matches!(
            SessionError::from(AuthenticationError::WrongTokenKind {
                expected: TokenKind::Refresh,
                actual: TokenKind::Access,
            }),
            SessionError::InvalidToken(_)
        ));
    }
}
