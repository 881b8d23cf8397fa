use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Purpose of a token.
///
/// Access and refresh tokens share a signing key; this field is what tells
/// them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by every token this crate issues.
///
/// Timestamps are Unix seconds as in RFC 7519.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Token purpose
    pub kind: TokenKind,

    /// Issued at
    pub iat: i64,

    /// Not before
    pub nbf: i64,

    /// Expiration time
    pub exp: i64,

    /// Unique token identifier
    pub jti: String,
}

impl TokenClaims {
    /// Create claims valid from `issued_at` for `ttl`.
    ///
    /// # Arguments
    /// * `subject` - Unique user identifier
    /// * `kind` - Access or refresh
    /// * `issued_at` - Issuance instant, also used as not-before
    /// * `ttl` - Lifetime of the token
    pub fn new(
        subject: impl ToString,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = issued_at.timestamp();

        Self {
            sub: subject.to_string(),
            kind,
            iat,
            nbf: iat,
            exp: (issued_at + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Expiration as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Check if token is expired at `current_timestamp`.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }

    /// Check if token is not yet usable at `current_timestamp`.
    pub fn is_premature(&self, current_timestamp: i64) -> bool {
        current_timestamp < self.nbf
    }
}
