use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::session::models::SessionSettings;

/// Shortest accepted JWT signing secret, in bytes.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Secret shipped in `config/default.toml`; must be overridden.
pub const PLACEHOLDER_JWT_SECRET: &str = "change-me-change-me-change-me-change-me";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub grpc_port: u16,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: i64,
    #[serde(default = "default_refresh_token_ttl_minutes")]
    pub refresh_token_ttl_minutes: i64,
    #[serde(default)]
    pub leeway_seconds: u64,
}

// Keeps the secret out of logs
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_minutes", &self.refresh_token_ttl_minutes)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // argon2 crate defaults
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub store_timeout_ms: u64,
    pub revoke_chain_on_reuse: bool,
    pub purge_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5_000,
            revoke_chain_on_reuse: true,
            purge_interval_seconds: 3_600,
        }
    }
}

impl SessionConfig {
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            revoke_chain_on_reuse: self.revoke_chain_on_reuse,
        }
    }
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_token_ttl_minutes() -> i64 {
    15
}

fn default_refresh_token_ttl_minutes() -> i64 {
    7 * 24 * 60
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the service cannot run safely with.
    ///
    /// # Errors
    /// * `ConfigError::Message` - Placeholder or short secret, or a non-positive lifetime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret == PLACEHOLDER_JWT_SECRET {
            return Err(ConfigError::Message(
                "jwt.secret still holds the shipped placeholder; set JWT__SECRET".to_string(),
            ));
        }

        if self.jwt.secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }

        if self.jwt.access_token_ttl_minutes <= 0 || self.jwt.refresh_token_ttl_minutes <= 0 {
            return Err(ConfigError::Message(
                "token lifetimes must be positive".to_string(),
            ));
        }

        if self.session.store_timeout_ms == 0 || self.session.purge_interval_seconds == 0 {
            return Err(ConfigError::Message(
                "session intervals must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
