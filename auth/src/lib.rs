//! Authentication utilities library
//!
//! Provides the credential primitives the user service builds sessions on:
//! - Password hashing (Argon2id)
//! - Signed access/refresh token issuance and validation (HS256 JWT)
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new().unwrap();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{TokenCodec, TokenKind};
//! use chrono::Duration;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let token = codec.sign("user123", TokenKind::Access, Duration::minutes(15)).unwrap();
//! let claims = codec.validate(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert_eq!(claims.kind, TokenKind::Access);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, TokenKind};
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue tokens
//! assert!(auth.verify_password("password123", Some(&hash)));
//! let tokens = auth.issue_token_pair("user123").unwrap();
//!
//! // Protected call: only access tokens are accepted
//! let claims = auth.validate_token(&tokens.access_token, TokenKind::Access).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert!(auth.validate_token(&tokens.refresh_token, TokenKind::Access).is_err());
//! ```

pub mod authenticator;
pub mod clock;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use authenticator::IssuedTokens;
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use jwt::TokenClaims;
pub use jwt::TokenCodec;
pub use jwt::TokenError;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
