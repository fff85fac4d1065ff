//! Server configuration loaded from the environment
//!
//! `main` calls `dotenv::dotenv()` first, so a `.env` file works too.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:chess.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
pub const DEFAULT_PERSIST_RETRIES: u32 = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Attempts per finished-match record before it is dropped
    pub persist_retries: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS),
            persist_retries: DEFAULT_PERSIST_RETRIES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = parse(
            "BIND_ADDR",
            lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let ttl_days: i64 = match lookup("TOKEN_TTL_DAYS") {
            Some(value) => parse("TOKEN_TTL_DAYS", value)?,
            None => DEFAULT_TOKEN_TTL_DAYS,
        };
        if ttl_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_DAYS",
                value: ttl_days.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let persist_retries = match lookup("PERSIST_RETRIES") {
            Some(value) => parse("PERSIST_RETRIES", value)?,
            None => DEFAULT_PERSIST_RETRIES,
        };

        Ok(ServerConfig {
            database_url,
            bind_addr,
            jwt_secret,
            token_ttl: Duration::days(ttl_days),
            persist_retries: persist_retries.max(1),
        })
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        reason: err.to_string(),
        value,
    })
}
