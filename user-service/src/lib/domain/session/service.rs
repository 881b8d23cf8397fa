use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::TokenKind;
use chrono::Utc;

use crate::domain::session::errors::SessionError;
use crate::domain::session::errors::StoreError;
use crate::domain::session::models::LoginOutcome;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::SessionSettings;
use crate::domain::session::models::TokenPair;
use crate::domain::session::ports::CredentialStore;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Domain service implementation for session and profile operations.
///
/// Owns the refresh-token rotation policy: every redemption revokes the
/// presented token before its successor is issued, so a failure halfway
/// leaves the session closed rather than forked.
pub struct SessionService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
    settings: SessionSettings,
}

impl<CS> SessionService<CS>
where
    CS: CredentialStore,
{
    /// Create a new session service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential persistence implementation
    /// * `authenticator` - Password hashing and token issuance
    /// * `settings` - Store timeout and reuse policy
    pub fn new(store: Arc<CS>, authenticator: Arc<Authenticator>, settings: SessionSettings) -> Self {
        Self {
            store,
            authenticator,
            settings,
        }
    }

    async fn timed<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match tokio::time::timeout(self.settings.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.settings.store_timeout.as_millis() as u64,
                    "Credential store call timed out"
                );
                Err(StoreError::Unavailable(format!("{} timed out", operation)))
            }
        }
    }

    /// Sign a new pair for `user_id` and persist its refresh record.
    async fn open_session(&self, user_id: &UserId) -> Result<TokenPair, SessionError> {
        let issued = self.authenticator.issue_token_pair(&user_id.to_string())?;

        let record = RefreshToken::new(
            *user_id,
            issued.refresh_token.clone(),
            issued.refresh_expires_at,
            Utc::now(),
        );
        self.timed("save_refresh_token", self.store.save_refresh_token(record))
            .await?;

        Ok(TokenPair {
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
        })
    }

    /// A signature-valid refresh token without an active record was presented.
    async fn contain_reuse(&self, user_id: &UserId) {
        if !self.settings.revoke_chain_on_reuse {
            tracing::warn!(user_id = %user_id, "Spent refresh token presented");
            return;
        }

        match self
            .timed("revoke_all_for_user", self.store.revoke_all_for_user(user_id))
            .await
        {
            Ok(revoked) => tracing::warn!(
                user_id = %user_id,
                revoked,
                "Spent refresh token presented, revoked all sessions of user"
            ),
            Err(e) => tracing::error!(
                user_id = %user_id,
                error = %e,
                "Spent refresh token presented, failed to revoke sessions of user"
            ),
        }
    }
}

#[async_trait]
impl<CS> SessionServicePort for SessionService<CS>
where
    CS: CredentialStore,
{
    async fn register(&self, command: RegisterCommand) -> Result<User, SessionError> {
        if command.password.is_empty() {
            return Err(SessionError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        // Fast path only; the store's unique constraint decides
        let existing = self
            .timed(
                "find_user_by_handle",
                self.store.find_user_by_handle(&command.phone_number),
            )
            .await?;
        if existing.is_some() {
            return Err(SessionError::AlreadyExists(
                command.phone_number.to_string(),
            ));
        }

        let password_hash = self.authenticator.hash_password(&command.password)?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            first_name: command.first_name,
            last_name: None,
            email: None,
            phone_number: command.phone_number,
            password_hash,
            created_at: now,
            updated_at: now,
        };

        let created_user = self
            .timed("create_user", self.store.create_user(user))
            .await?;

        tracing::info!(user_id = %created_user.id, "User registered");

        Ok(created_user)
    }

    async fn login(
        &self,
        phone_number: &PhoneNumber,
        password: &str,
    ) -> Result<LoginOutcome, SessionError> {
        let user = self
            .timed("find_user_by_handle", self.store.find_user_by_handle(phone_number))
            .await?;

        let verified = self
            .authenticator
            .verify_password(password, user.as_ref().map(|u| u.password_hash.as_str()));

        let user = match user {
            Some(user) if verified => user,
            _ => {
                tracing::info!("Login rejected");
                return Err(SessionError::InvalidCredentials);
            }
        };

        let tokens = self.open_session(&user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome { user, tokens })
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let claims = self
            .authenticator
            .validate_token(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                tracing::debug!(error = %e, "Refresh token rejected");
                SessionError::from(e)
            })?;

        let user_id = UserId::from_string(claims.subject())
            .map_err(|_| SessionError::InvalidToken("invalid subject".to_string()))?;

        let record = self
            .timed(
                "find_active_refresh_token",
                self.store.find_active_refresh_token(refresh_token),
            )
            .await?;

        let Some(record) = record else {
            self.contain_reuse(&user_id).await;
            return Err(SessionError::TokenNotFound);
        };

        if record.user_id != user_id {
            tracing::warn!(
                user_id = %user_id,
                record_user_id = %record.user_id,
                "Refresh token subject does not match its record"
            );
            return Err(SessionError::InvalidToken("subject mismatch".to_string()));
        }

        match self
            .timed(
                "revoke_refresh_token",
                self.store.revoke_refresh_token(refresh_token),
            )
            .await
        {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                // Another redemption of the same token won the race
                self.contain_reuse(&user_id).await;
                return Err(SessionError::TokenNotFound);
            }
            Err(e) => return Err(e.into()),
        }

        // The presented token is spent from here on; failing now requires a new login
        let tokens = self.open_session(&user_id).await.map_err(|e| {
            tracing::error!(
                user_id = %user_id,
                error = %e,
                "Failed to issue successor tokens, session closed"
            );
            e
        })?;

        tracing::info!(user_id = %user_id, "Tokens refreshed");

        Ok(tokens)
    }

    async fn logout(&self, user_id: &UserId) -> Result<(), SessionError> {
        let revoked = self
            .timed("revoke_all_for_user", self.store.revoke_all_for_user(user_id))
            .await?;

        tracing::info!(user_id = %user_id, revoked, "User logged out");

        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<User, SessionError> {
        self.timed("find_user_by_id", self.store.find_user_by_id(user_id))
            .await?
            .ok_or(SessionError::NotFound(user_id.to_string()))
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, SessionError> {
        let mut user = self
            .timed("find_user_by_id", self.store.find_user_by_id(user_id))
            .await?
            .ok_or(SessionError::NotFound(user_id.to_string()))?;

        if let Some(first_name) = command.first_name {
            user.first_name = first_name;
        }

        if let Some(last_name) = command.last_name {
            user.last_name = last_name;
        }

        if let Some(email) = command.email {
            user.email = email;
        }

        if let Some(phone_number) = command.phone_number {
            user.phone_number = phone_number;
        }

        user.updated_at = Utc::now();

        let updated_user = self
            .timed("update_user", self.store.update_user(user))
            .await?;

        tracing::info!(user_id = %updated_user.id, "Profile updated");

        Ok(updated_user)
    }

    async fn purge_expired_tokens(&self) -> Result<u64, SessionError> {
        let purged = self
            .timed(
                "purge_expired_refresh_tokens",
                self.store.purge_expired_refresh_tokens(Utc::now()),
            )
            .await?;

        tracing::debug!(purged, "Expired refresh tokens purged");

        Ok(purged)
    }
}
