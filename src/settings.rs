//! Process settings from environment variables.

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const BIND: &str = "RESTGUARDIAN_BIND";
pub const MAX_CONNECTIONS: &str = "RESTGUARDIAN_MAX_CONNECTIONS";
pub const STATEMENT_TIMEOUT_MS: &str = "RESTGUARDIAN_STATEMENT_TIMEOUT_MS";
pub const BODY_LIMIT_BYTES: &str = "RESTGUARDIAN_BODY_LIMIT_BYTES";
pub const INCLUDE_SYSTEM_SCHEMAS: &str = "RESTGUARDIAN_INCLUDE_SYSTEM_SCHEMAS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub bind: SocketAddr,
    pub max_connections: u32,
    /// Upper bound for each backend call, and for acquiring a pooled connection.
    pub statement_timeout: Duration,
    pub body_limit_bytes: usize,
    pub include_system_schemas: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/postgres".into(),
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_connections: 5,
            statement_timeout: Duration::from_millis(5000),
            body_limit_bytes: 1024 * 1024,
            include_system_schemas: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        Ok(Settings {
            database_url: lookup(DATABASE_URL).unwrap_or(defaults.database_url),
            bind: parse_or(&lookup, BIND, defaults.bind)?,
            max_connections: parse_or(&lookup, MAX_CONNECTIONS, defaults.max_connections)?,
            statement_timeout: Duration::from_millis(parse_or(
                &lookup,
                STATEMENT_TIMEOUT_MS,
                defaults.statement_timeout.as_millis() as u64,
            )?),
            body_limit_bytes: parse_or(&lookup, BODY_LIMIT_BYTES, defaults.body_limit_bytes)?,
            include_system_schemas: parse_flag(&lookup, INCLUDE_SYSTEM_SCHEMAS, defaults.include_system_schemas)?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse() {
            Ok(v) => Ok(v),
            Err(_) => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}
