use tonic::Status;

use crate::domain::session::errors::SessionError;
use crate::domain::user::models::User;

pub mod get_profile;
pub mod login;
pub mod logout;
pub mod refresh_tokens;
pub mod register;
pub mod update_profile;

impl From<User> for crate::proto::User {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            first_name: user.first_name.as_str().to_string(),
            last_name: user
                .last_name
                .map(|n| n.as_str().to_string())
                .unwrap_or_default(),
            email: user
                .email
                .map(|e| e.as_str().to_string())
                .unwrap_or_default(),
            phone_number: user.phone_number.as_str().to_string(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Convert domain errors to gRPC status codes.
///
/// Credential and token failures share generic messages; details only go to
/// the log.
impl From<SessionError> for Status {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::InvalidInput(message) => Status::invalid_argument(message),
            SessionError::InvalidCredentials => Status::unauthenticated("Invalid credentials"),
            SessionError::AlreadyExists(_) => Status::already_exists("User already exists"),
            SessionError::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "Token rejected");
                Status::unauthenticated("Invalid or expired token")
            }
            SessionError::Expired | SessionError::TokenNotFound => {
                Status::unauthenticated("Invalid or expired token")
            }
            SessionError::NotFound(_) => Status::not_found("User not found"),
            SessionError::Unavailable(reason) => {
                tracing::warn!(reason = %reason, "Dependency unavailable");
                Status::unavailable("Service temporarily unavailable")
            }
            SessionError::Internal(reason) => {
                tracing::error!(reason = %reason, "Internal error");
                Status::internal("Internal error")
            }
        }
    }
}
