use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::session::errors::StoreError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::ports::CredentialStore;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

impl State {
    fn handle_taken_by_other(&self, phone_number: &PhoneNumber, owner: &UserId) -> bool {
        self.users
            .values()
            .any(|u| u.phone_number == *phone_number && u.id != *owner)
    }
}

/// Credential store kept in process memory.
///
/// A single lock guards users and refresh tokens, which makes the revoke
/// compare-and-swap trivially atomic. Used by tests and local runs.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    state: RwLock<State>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if state.handle_taken_by_other(&user.phone_number, &user.id) {
            return Err(StoreError::Conflict(user.phone_number.to_string()));
        }
        if state.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(user.id.to_string()));
        }

        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_handle(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.phone_number == *phone_number)
            .cloned())
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn update_user(&self, user: User) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&user.id) {
            return Err(StoreError::NotFound(user.id.to_string()));
        }
        if state.handle_taken_by_other(&user.phone_number, &user.id) {
            return Err(StoreError::Conflict(user.phone_number.to_string()));
        }

        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save_refresh_token(&self, token: RefreshToken) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        if state.refresh_tokens.contains_key(&token.token) {
            return Err(StoreError::Conflict("refresh token".to_string()));
        }

        state.refresh_tokens.insert(token.token.clone(), token);
        Ok(())
    }

    async fn find_active_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, StoreError> {
        let now = Utc::now();
        let state = self.state.read().await;
        Ok(state
            .refresh_tokens
            .get(token)
            .filter(|record| record.is_active(now))
            .cloned())
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        match state.refresh_tokens.get_mut(token) {
            Some(record) if record.is_active(now) => {
                record.revoked = true;
                Ok(())
            }
            _ => Err(StoreError::NotFound("active refresh token".to_string())),
        }
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let mut revoked = 0;
        for record in state.refresh_tokens.values_mut() {
            if record.user_id == *user_id && record.is_active(now) {
                record.revoked = true;
                revoked += 1;
            }
        }

        Ok(revoked)
    }

    async fn purge_expired_refresh_tokens(
        &self,
        before: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;

        let count_before = state.refresh_tokens.len();
        state
            .refresh_tokens
            .retain(|_, record| record.expires_at >= before);

        Ok((count_before - state.refresh_tokens.len()) as u64)
    }
}
