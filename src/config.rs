//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8000)
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Cache backend selector
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process cache, lost on restart
    #[default]
    Memory,
    /// External Redis server
    Redis,
}

/// Blog read cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Redis connection URL (required when backend = "redis")
    pub redis_url: Option<String>,
    /// TTL of cached blog lists and details in seconds (default: 600)
    pub blog_ttl_seconds: u64,
    /// Capacity of the in-memory backend (default: 10000)
    pub max_entries: u64,
}

/// Token and password configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens (32+ bytes)
    pub jwt_secret: String,
    /// Token lifetime in hours (default: 24)
    pub token_ttl_hours: i64,
    /// bcrypt work factor (default: 12)
    pub bcrypt_cost: u32,
    /// Lifetime of a password reset code in minutes (default: 10)
    pub reset_code_ttl_minutes: i64,
}

/// Outgoing mail configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// From address used for reset code mails
    pub sender: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set
    pub fn default_filter(&self) -> String {
        format!("gatorblog={},tower_http=debug", self.level)
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (GATORBLOG__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.path", "data/gatorblog.db")?
            .set_default("cache.backend", "memory")?
            .set_default("cache.blog_ttl_seconds", 600)?
            .set_default("cache.max_entries", 10_000)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("auth.bcrypt_cost", 12)?
            .set_default("auth.reset_code_ttl_minutes", 10)?
            .set_default("mail.sender", "no-reply@localhost")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("GATORBLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        const MIN_JWT_SECRET_BYTES: usize = 32;

        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }

        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(AppError::Config(format!(
                "auth.token_ttl_hours must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            )));
        }

        if !(1..=MAX_RESET_CODE_TTL_MINUTES).contains(&self.auth.reset_code_ttl_minutes) {
            return Err(AppError::Config(format!(
                "auth.reset_code_ttl_minutes must be between 1 and {}",
                MAX_RESET_CODE_TTL_MINUTES
            )));
        }

        if !(bcrypt_cost_range()).contains(&self.auth.bcrypt_cost) {
            return Err(AppError::Config(format!(
                "auth.bcrypt_cost must be between {} and {}",
                bcrypt_cost_range().start(),
                bcrypt_cost_range().end()
            )));
        }

        if self.cache.blog_ttl_seconds == 0 {
            return Err(AppError::Config(
                "cache.blog_ttl_seconds must be greater than 0".to_string(),
            ));
        }

        if self.cache.backend == CacheBackend::Redis
            && self
                .cache
                .redis_url
                .as_deref()
                .map(str::trim)
                .is_none_or(str::is_empty)
        {
            return Err(AppError::Config(
                "cache.redis_url is required when cache.backend=redis".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(AppError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }

        Ok(())
    }
}

/// One year
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;
/// One day
const MAX_RESET_CODE_TTL_MINUTES: i64 = 24 * 60;

fn bcrypt_cost_range() -> std::ops::RangeInclusive<u32> {
    4..=31
}
