use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Server-side record of an issued refresh token.
///
/// `token` is the signed token string itself and is the lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshToken {
    /// Create an active record for a freshly signed token.
    pub fn new(
        user_id: UserId,
        token: String,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at,
            created_at,
            revoked: false,
        }
    }

    /// Unrevoked and unexpired at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

/// Tokens handed back to the client after login or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

/// Tunables of the session service.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Upper bound for a single credential store call
    pub store_timeout: Duration,

    /// Revoke every refresh token of a user when one of their spent tokens is replayed
    pub revoke_chain_on_reuse: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            revoke_chain_on_reuse: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;

    #[test]
    fn test_refresh_token_activity() {
        let now = Utc::now();
        let mut record = RefreshToken::new(
            UserId::new(),
            "token".to_string(),
            now + ChronoDuration::hours(1),
            now,
        );

        assert!(record.is_active(now));
        assert!(!record.is_active(now + ChronoDuration::hours(2)));

        record.revoked = true;
        assert!(!record.is_active(now));
    }
}
