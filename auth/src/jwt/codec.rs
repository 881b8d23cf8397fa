use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::TokenClaims;
use super::claims::TokenKind;
use super::errors::TokenError;
use crate::clock::Clock;
use crate::clock::SystemClock;

/// Signs and validates access/refresh tokens.
///
/// Uses HS256 (HMAC with SHA-256) and nothing else: a token whose header
/// names any other algorithm is rejected before its claims are looked at.
/// Time checks run against the injected [`Clock`] rather than the library's
/// own notion of now.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    leeway_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a new codec with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Changing the secret invalidates every outstanding token
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            leeway_seconds: 0,
            clock: Arc::new(SystemClock),
        }
    }

    /// Tolerate this much clock skew on `nbf` and `exp`.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the codec's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Build claims issued now.
    pub fn claims_for(&self, subject: &str, kind: TokenKind, ttl: Duration) -> TokenClaims {
        TokenClaims::new(subject, kind, self.now(), ttl)
    }

    /// Sign a token for `subject` that lives for `ttl`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn sign(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<String, TokenError> {
        self.encode(&self.claims_for(subject, kind, ttl))
    }

    /// Encode prepared claims into a signed token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// * `InvalidSignature` - Signature mismatch or unexpected algorithm
    /// * `Expired` - Token expiry has passed
    /// * `NotYetValid` - Token not-before is in the future
    /// * `Malformed` - Token cannot be decoded or lacks required claims
    pub fn validate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = vec![self.algorithm];
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);
        // Expiry and not-before are checked below against our own clock
        validation.validate_exp = false;
        validation.validate_nbf = false;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidKeyFormat => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        let claims = token_data.claims;
        let now = self.now().timestamp();

        if claims.is_premature(now.saturating_add(self.leeway_seconds)) {
            return Err(TokenError::NotYetValid);
        }
        if claims.is_expired(now.saturating_sub(self.leeway_seconds)) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;
    use crate::clock::ManualClock;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    fn codec_with_clock() -> (TokenCodec, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let codec = TokenCodec::new(SECRET).with_clock(clock.clone());
        (codec, clock)
    }

    #[test]
    fn test_sign_and_validate() {
        let codec = TokenCodec::new(SECRET);

        let token = codec
            .sign("user123", TokenKind::Access, Duration::minutes(15))
            .expect("Failed to sign token");
        assert!(!token.is_empty());

        let claims = codec.validate(&token).expect("Failed to validate token");
        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_refresh_kind_round_trip() {
        let codec = TokenCodec::new(SECRET);

        let token = codec
            .sign("user123", TokenKind::Refresh, Duration::days(7))
            .unwrap();
        let claims = codec.validate(&token).unwrap();

        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_validate_invalid_token() {
        let codec = TokenCodec::new(SECRET);

        let result = codec.validate("invalid.token.here");
        assert!(matches!(result, Err(TokenError::Malformed(_))));

        let result = codec.validate("");
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let codec1 = TokenCodec::new(b"secret1_at_least_32_bytes_long_key!");
        let codec2 = TokenCodec::new(b"secret2_at_least_32_bytes_long_key!");

        let token = codec1
            .sign("user123", TokenKind::Access, Duration::minutes(5))
            .unwrap();

        assert_eq!(codec2.validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let codec = TokenCodec::new(SECRET);

        let mine = codec
            .sign("user123", TokenKind::Access, Duration::minutes(5))
            .unwrap();
        let theirs = codec
            .sign("admin", TokenKind::Access, Duration::minutes(5))
            .unwrap();

        let mine_parts: Vec<&str> = mine.split('.').collect();
        let theirs_parts: Vec<&str> = theirs.split('.').collect();
        let forged = format!("{}.{}.{}", mine_parts[0], theirs_parts[1], mine_parts[2]);

        assert_eq!(codec.validate(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_other_algorithm_with_same_secret_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let claims = codec.claims_for("user123", TokenKind::Access, Duration::minutes(5));

        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(codec.validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_unsigned_token_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .sign("user123", TokenKind::Access, Duration::minutes(5))
            .unwrap();
        let payload = token.split('.').nth(1).unwrap();

        // {"alg":"none","typ":"JWT"}
        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", payload);

        let result = codec.validate(&unsigned);
        assert!(matches!(
            result,
            Err(TokenError::InvalidSignature) | Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_expiry() {
        let (codec, clock) = codec_with_clock();

        let token = codec
            .sign("user123", TokenKind::Access, Duration::seconds(60))
            .unwrap();

        clock.advance(Duration::seconds(59));
        assert!(codec.validate(&token).is_ok());

        clock.advance(Duration::seconds(2));
        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_leeway_extends_expiry() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let codec = TokenCodec::new(SECRET)
            .with_clock(clock.clone())
            .with_leeway(30);

        let token = codec
            .sign("user123", TokenKind::Access, Duration::seconds(60))
            .unwrap();

        clock.advance(Duration::seconds(75));
        assert!(codec.validate(&token).is_ok());

        clock.advance(Duration::seconds(30));
        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_not_yet_valid() {
        let (codec, clock) = codec_with_clock();

        let token = codec
            .sign("user123", TokenKind::Access, Duration::minutes(5))
            .unwrap();

        clock.advance(Duration::seconds(-10));
        assert_eq!(codec.validate(&token), Err(TokenError::NotYetValid));
    }

    #[test]
    fn test_missing_claims_is_malformed() {
        #[derive(Serialize)]
        struct Partial {
            sub: String,
            exp: i64,
            nbf: i64,
        }

        let codec = TokenCodec::new(SECRET);
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Partial {
                sub: "user123".to_string(),
                exp: now + 60,
                nbf: now,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(codec.validate(&token), Err(TokenError::Malformed(_))));
    }
}
