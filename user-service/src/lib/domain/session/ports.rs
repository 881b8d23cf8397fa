use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::errors::SessionError;
use crate::domain::session::errors::StoreError;
use crate::domain::session::models::LoginOutcome;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::TokenPair;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Port for session and profile operations exposed to the transport layer.
#[async_trait]
pub trait SessionServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `command` - Validated first name, phone number and plaintext password
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `AlreadyExists` - Phone number is already registered
    /// * `InvalidInput` - Password is empty or too long
    /// * `Unavailable` - Store unreachable or timed out
    async fn register(&self, command: RegisterCommand) -> Result<User, SessionError>;

    /// Verify credentials and open a session.
    ///
    /// # Arguments
    /// * `phone_number` - Login handle
    /// * `password` - Plaintext password
    ///
    /// # Returns
    /// The user plus a fresh access/refresh pair
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown handle or wrong password (indistinguishable)
    /// * `Unavailable` - Store unreachable or timed out
    async fn login(
        &self,
        phone_number: &PhoneNumber,
        password: &str,
    ) -> Result<LoginOutcome, SessionError>;

    /// Redeem a refresh token for a new pair, revoking the presented one.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed, bad signature, or not a refresh token
    /// * `Expired` - Refresh token expired
    /// * `TokenNotFound` - Token unknown, revoked, or lost a concurrent redemption
    /// * `Unavailable` - Store unreachable or timed out
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, SessionError>;

    /// Revoke every active refresh token of a user. Idempotent.
    async fn logout(&self, user_id: &UserId) -> Result<(), SessionError>;

    /// Retrieve the profile of a user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn get_profile(&self, user_id: &UserId) -> Result<User, SessionError>;

    /// Apply a partial profile update.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `AlreadyExists` - New phone number is already registered
    async fn update_profile(
        &self,
        user_id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, SessionError>;

    /// Delete refresh-token records that have expired.
    ///
    /// # Returns
    /// Number of deleted records
    async fn purge_expired_tokens(&self) -> Result<u64, SessionError>;
}

/// Persistence of users and refresh-token records.
///
/// Lookups report absence as `Ok(None)`; writes that target a missing record
/// report `StoreError::NotFound`.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `Conflict` - Phone number is already taken (must be enforced by the
    ///   store itself, not by a prior lookup)
    /// * `Database` / `Unavailable` - Backend failure
    async fn create_user(&self, user: User) -> Result<User, StoreError>;

    /// Retrieve user by login handle.
    async fn find_user_by_handle(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<Option<User>, StoreError>;

    /// Retrieve user by identifier.
    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// Overwrite the mutable fields of an existing user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Conflict` - New phone number is already taken
    async fn update_user(&self, user: User) -> Result<User, StoreError>;

    /// Persist a refresh-token record.
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<(), StoreError>;

    /// Retrieve the record for `token` if it is unrevoked and unexpired.
    async fn find_active_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, StoreError>;

    /// Atomically flip `revoked` on the record for `token` if it is still active.
    ///
    /// Exactly one of several concurrent callers succeeds.
    ///
    /// # Errors
    /// * `NotFound` - No active record (unknown, already revoked, or expired)
    async fn revoke_refresh_token(&self, token: &str) -> Result<(), StoreError>;

    /// Revoke every active refresh token of a user.
    ///
    /// # Returns
    /// Number of records revoked by this call
    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, StoreError>;

    /// Delete records whose expiry lies before `before`.
    ///
    /// # Returns
    /// Number of deleted records
    async fn purge_expired_refresh_tokens(&self, before: DateTime<Utc>)
        -> Result<u64, StoreError>;
}
