//! Application configuration management.
//!
//! Configuration is loaded once at startup and handed to constructors
//! explicitly; nothing reads it through a global.

use serde::Deserialize;

use crate::jwt::JwtConfig;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Daily record ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// How long to wait for a pooled connection, in seconds.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    10
}

/// JWT settings as read from configuration sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    1800 // 30 minutes
}

/// When stale (past-dated) unlocked records get locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Lock a stale record when it is loaded for modification.
    Lazy,
    /// Lock stale records from a periodic background job.
    Scheduled,
    /// Both of the above.
    Both,
}

impl LockMode {
    /// Returns true if stale records are locked on access.
    #[must_use]
    pub const fn locks_on_access(self) -> bool {
        matches!(self, Self::Lazy | Self::Both)
    }

    /// Returns true if the periodic auto-lock job should run.
    #[must_use]
    pub const fn runs_scheduled(self) -> bool {
        matches!(self, Self::Scheduled | Self::Both)
    }
}

/// Daily record ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Auto-lock strategy.
    #[serde(default = "default_lock_mode")]
    pub lock_mode: LockMode,
    /// Interval of the scheduled auto-lock job, in seconds.
    #[serde(default = "default_auto_lock_interval")]
    pub auto_lock_interval_secs: u64,
    /// Offset from UTC, in minutes, used to decide what "today" is.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Maximum number of corrections per record, unlimited when absent.
    #[serde(default)]
    pub max_corrections: Option<i32>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_mode: default_lock_mode(),
            auto_lock_interval_secs: default_auto_lock_interval(),
            utc_offset_minutes: 0,
            max_corrections: None,
        }
    }
}

fn default_lock_mode() -> LockMode {
    LockMode::Both
}

fn default_auto_lock_interval() -> u64 {
    300
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default.toml`, `config/{RUN_MODE}.toml`, `SITEBOOK__*` env vars.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SITEBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Builds the token service configuration.
    #[must_use]
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt.secret.clone(),
            access_token_expires_minutes: i64::try_from(self.jwt.access_token_expiry_secs / 60)
                .unwrap_or(i64::MAX),
        }
    }
}
