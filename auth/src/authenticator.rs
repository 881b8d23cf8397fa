use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::TokenClaims;
use crate::jwt::TokenCodec;
use crate::jwt::TokenError;
use crate::jwt::TokenKind;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
const DEFAULT_REFRESH_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Authentication coordinator combining password verification and token issuance.
///
/// Provides high-level authentication operations by coordinating
/// password hashing and token handling.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

/// Access/refresh pair produced by a successful login or refresh.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Short-lived token for protected calls
    pub access_token: String,

    /// Long-lived single-use token for minting the next pair
    pub refresh_token: String,

    /// Expiry embedded in the refresh token
    pub refresh_expires_at: DateTime<Utc>,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Wrong token type: expected {expected}, got {actual}")]
    WrongTokenKind {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for token signing
    ///
    /// # Returns
    /// Authenticator with default Argon2 cost, 15 minute access tokens and
    /// 7 day refresh tokens
    ///
    /// # Errors
    /// * `PasswordError` - The password hasher could not be built
    pub fn new(jwt_secret: &[u8]) -> Result<Self, PasswordError> {
        Ok(Self::from_parts(
            PasswordHasher::new()?,
            TokenCodec::new(jwt_secret),
        ))
    }

    /// Create an authenticator from already configured parts.
    pub fn from_parts(password_hasher: PasswordHasher, token_codec: TokenCodec) -> Self {
        Self {
            password_hasher,
            token_codec,
            access_token_ttl: Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            refresh_token_ttl: Duration::minutes(DEFAULT_REFRESH_TOKEN_TTL_MINUTES),
        }
    }

    /// Override token lifetimes.
    pub fn with_token_ttls(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_token_ttl = access;
        self.refresh_token_ttl = refresh;
        self
    }

    pub fn token_codec(&self) -> &TokenCodec {
        &self.token_codec
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed or input too long
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against a stored hash, if there is one.
    ///
    /// With no stored hash a dummy verification still runs so both outcomes
    /// cost the same.
    pub fn verify_password(&self, password: &str, stored_hash: Option<&str>) -> bool {
        match stored_hash {
            Some(hash) => self.password_hasher.verify(password, hash),
            None => {
                self.password_hasher.verify_dummy(password);
                false
            }
        }
    }

    /// Issue one access token and one refresh token for `subject`.
    ///
    /// # Errors
    /// * `TokenError` - Token generation failed
    pub fn issue_token_pair(&self, subject: &str) -> Result<IssuedTokens, TokenError> {
        let access_claims = self
            .token_codec
            .claims_for(subject, TokenKind::Access, self.access_token_ttl);
        let refresh_claims = self
            .token_codec
            .claims_for(subject, TokenKind::Refresh, self.refresh_token_ttl);

        Ok(IssuedTokens {
            access_token: self.token_codec.encode(&access_claims)?,
            refresh_token: self.token_codec.encode(&refresh_claims)?,
            refresh_expires_at: refresh_claims.expires_at(),
        })
    }

    /// Validate a token and require it to be of `expected` kind.
    ///
    /// # Errors
    /// * `TokenError` - Signature, expiry or format check failed
    /// * `WrongTokenKind` - Token is valid but meant for another purpose
    pub fn validate_token(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> Result<TokenClaims, AuthenticationError> {
        let claims = self.token_codec.validate(token)?;

        if claims.kind != expected {
            return Err(AuthenticationError::WrongTokenKind {
                expected,
                actual: claims.kind,
            });
        }

        Ok(claims)
    }
}
