//! Process configuration for the identity service.
//!
//! Everything is read once at startup from the environment (optionally seeded
//! from a `.env` file) and is immutable afterwards.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";
pub const DEFAULT_JWT_ISSUER: &str = "akiba-api";
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: u64 = 3600;
pub const DEFAULT_DB_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_BCRYPT_COST: u32 = 10;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("JWT_SECRET cannot be empty")]
    EmptyJwtSecret,
    #[error("JWT_ISSUER cannot be empty")]
    EmptyJwtIssuer,
    #[error("PORT must be > 0")]
    InvalidPort,
    #[error("{0} must be > 0")]
    NonPositiveDuration(&'static str),
    #[error("BCRYPT_COST must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),
    #[error("unknown ACCOUNT_STORE backend: {0}")]
    UnknownStoreBackend(String),
}

/// Token signing parameters, fixed for the lifetime of the process.
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Parameters of the signup/login flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    pub access_token_ttl: Duration,
    /// Upper bound for every store call and every hash computation.
    pub operation_timeout: Duration,
    pub bcrypt_cost: u32,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::from_secs(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
            operation_timeout: Duration::from_secs(DEFAULT_DB_TIMEOUT_SECONDS),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::UnknownStoreBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub identity: IdentitySettings,
    pub store_backend: StoreBackend,
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset and
    /// unparsable numbers fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let get_num = |key: &str, default: u64| -> u64 {
            match get(key) {
                Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                    tracing::warn!(key, value = %raw, "Unparsable numeric setting, using default");
                    default
                }),
                None => default,
            }
        };

        let port = get_num("PORT", DEFAULT_PORT as u64);
        if port == 0 || port > u16::MAX as u64 {
            return Err(ConfigError::InvalidPort);
        }

        let secret = get_or("JWT_SECRET", DEFAULT_JWT_SECRET);
        if secret.trim().is_empty() {
            return Err(ConfigError::EmptyJwtSecret);
        }
        let issuer = get_or("JWT_ISSUER", DEFAULT_JWT_ISSUER);
        if issuer.trim().is_empty() {
            return Err(ConfigError::EmptyJwtIssuer);
        }

        let ttl = get_num("ACCESS_TOKEN_TTL_SECONDS", DEFAULT_ACCESS_TOKEN_TTL_SECONDS);
        if ttl == 0 {
            return Err(ConfigError::NonPositiveDuration("ACCESS_TOKEN_TTL_SECONDS"));
        }
        let timeout = get_num("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECONDS);
        if timeout == 0 {
            return Err(ConfigError::NonPositiveDuration("DB_TIMEOUT_SECONDS"));
        }

        let cost = get_num("BCRYPT_COST", DEFAULT_BCRYPT_COST as u64);
        let cost = u32::try_from(cost).unwrap_or(u32::MAX);
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(ConfigError::InvalidBcryptCost(cost));
        }

        let store_backend = get_or("ACCOUNT_STORE", "postgres").parse()?;

        Ok(Self {
            environment: get_or("ENV", "development"),
            port: port as u16,
            jwt: JwtConfig { secret, issuer },
            identity: IdentitySettings {
                access_token_ttl: Duration::from_secs(ttl),
                operation_timeout: Duration::from_secs(timeout),
                bcrypt_cost: cost,
            },
            store_backend,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// The built-in secret is only meant for local development.
    pub fn uses_default_secret(&self) -> bool {
        self.jwt.secret == DEFAULT_JWT_SECRET
    }
}
