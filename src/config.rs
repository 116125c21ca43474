// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATABASE_PATH` | redb file, or `:memory:` for a throwaway database | `./data/taskmanager.redb` |
//! | `JWT_SECRET` | HS256 signing secret | Development default (warns) |
//! | `TOKEN_TTL_HOURS` | Token validity window, at most one year | `24` |
//! | `TOKEN_LEEWAY_SECS` | Clock skew tolerated on token expiry | `0` |
//! | `STORE_TIMEOUT_SECS` | Bound on a single store call | `5` |
//! | `ARGON2_MEMORY_KIB` | Argon2id memory cost | `19456` |
//! | `ARGON2_ITERATIONS` | Argon2id passes | `2` |
//! | `ARGON2_PARALLELISM` | Argon2id lanes | `1` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::{HashCost, DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};
use crate::logging::LogFormat;
use crate::storage::DEFAULT_STORE_TIMEOUT;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Path of the redb database file.
///
/// The special value [`IN_MEMORY_DATABASE`] selects the in-memory backend.
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";

/// Signing secret for session tokens. Must be set in production.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

pub const TOKEN_TTL_HOURS_ENV: &str = "TOKEN_TTL_HOURS";
pub const TOKEN_LEEWAY_SECS_ENV: &str = "TOKEN_LEEWAY_SECS";
pub const STORE_TIMEOUT_SECS_ENV: &str = "STORE_TIMEOUT_SECS";
pub const ARGON2_MEMORY_KIB_ENV: &str = "ARGON2_MEMORY_KIB";
pub const ARGON2_ITERATIONS_ENV: &str = "ARGON2_ITERATIONS";
pub const ARGON2_PARALLELISM_ENV: &str = "ARGON2_PARALLELISM";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_PATH: &str = "./data/taskmanager.redb";
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Tolerated clock skew is capped at five minutes.
const MAX_TOKEN_LEEWAY_SECS: u64 = 300;

/// Used when `JWT_SECRET` is unset. Only suitable for local development.
const DEVELOPMENT_JWT_SECRET: &str = "your-secret-key-change-in-production";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(String),
    InMemory,
}

/// Process configuration, loaded once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseLocation,
    pub jwt_secret: String,
    /// Whether `jwt_secret` came from the built-in development default.
    pub using_default_secret: bool,
    pub token_ttl: chrono::Duration,
    pub token_leeway_secs: u64,
    pub store_timeout: Duration,
    pub hash_cost: HashCost,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?;

        let database = match lookup(DATABASE_PATH_ENV) {
            Some(path) if path == IN_MEMORY_DATABASE => DatabaseLocation::InMemory,
            Some(path) if !path.trim().is_empty() => DatabaseLocation::File(path),
            _ => DatabaseLocation::File(DEFAULT_DATABASE_PATH.to_string()),
        };

        let (jwt_secret, using_default_secret) = match lookup(JWT_SECRET_ENV) {
            Some(secret) if !secret.is_empty() => (secret, false),
            _ => (DEVELOPMENT_JWT_SECRET.to_string(), true),
        };

        let ttl_hours: i64 = parse_or(&lookup, TOKEN_TTL_HOURS_ENV, DEFAULT_TOKEN_TTL_HOURS)?;
        let token_ttl = match chrono::TimeDelta::try_hours(ttl_hours) {
            Some(ttl) if (1..=MAX_TOKEN_TTL_HOURS).contains(&ttl_hours) => ttl,
            _ => {
                return Err(ConfigError::InvalidValue {
                    name: TOKEN_TTL_HOURS_ENV,
                    value: ttl_hours.to_string(),
                    reason: format!("must be between 1 and {MAX_TOKEN_TTL_HOURS}"),
                })
            }
        };

        let token_leeway_secs: u64 = parse_or(&lookup, TOKEN_LEEWAY_SECS_ENV, 0)?;
        if token_leeway_secs > MAX_TOKEN_LEEWAY_SECS {
            return Err(ConfigError::InvalidValue {
                name: TOKEN_LEEWAY_SECS_ENV,
                value: token_leeway_secs.to_string(),
                reason: format!("must be at most {MAX_TOKEN_LEEWAY_SECS}"),
            });
        }

        let timeout_secs: u64 =
            parse_or(&lookup, STORE_TIMEOUT_SECS_ENV, DEFAULT_STORE_TIMEOUT.as_secs())?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: STORE_TIMEOUT_SECS_ENV,
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }

        let defaults = HashCost::default();
        let hash_cost = HashCost {
            memory_kib: parse_or(&lookup, ARGON2_MEMORY_KIB_ENV, defaults.memory_kib)?,
            iterations: parse_or(&lookup, ARGON2_ITERATIONS_ENV, defaults.iterations)?,
            parallelism: parse_or(&lookup, ARGON2_PARALLELISM_ENV, defaults.parallelism)?,
        };

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                name: LOG_FORMAT_ENV,
                value,
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host,
            port,
            database,
            jwt_secret,
            using_default_secret,
            token_ttl,
            token_leeway_secs,
            store_timeout: Duration::from_secs(timeout_secs),
            hash_cost,
            log_format,
        })
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                name: HOST_ENV,
                value: self.host.clone(),
                reason: e.to_string(),
            })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("jwt_secret", &"<redacted>")
            .field("using_default_secret", &self.using_default_secret)
            .field("token_ttl_hours", &self.token_ttl.num_hours())
            .field("token_leeway_secs", &self.token_leeway_secs)
            .field("store_timeout", &self.store_timeout)
            .field("hash_cost", &self.hash_cost)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(
            config.database,
            DatabaseLocation::File(DEFAULT_DATABASE_PATH.into())
        );
        assert!(config.using_default_secret);
        assert_eq!(config.token_ttl, chrono::Duration::hours(24));
        assert_eq!(config.token_leeway_secs, 0);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.hash_cost, HashCost::default());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DATABASE_PATH", ":memory:"),
            ("JWT_SECRET", "s3cret-s3cret-s3cret-s3cret-s3cret"),
            ("TOKEN_TTL_HOURS", "1"),
            ("TOKEN_LEEWAY_SECS", "30"),
            ("STORE_TIMEOUT_SECS", "2"),
            ("ARGON2_MEMORY_KIB", "4096"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(config.database, DatabaseLocation::InMemory);
        assert!(!config.using_default_secret);
        assert_eq!(config.token_ttl, chrono::Duration::hours(1));
        assert_eq!(config.token_leeway_secs, 30);
        assert_eq!(config.store_timeout, Duration::from_secs(2));
        assert_eq!(config.hash_cost.memory_kib, 4096);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_numbers_are_errors() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("TOKEN_TTL_HOURS", "0")]).is_err());
        assert!(load(&[("STORE_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn token_ttl_is_bounded() {
        assert!(load(&[("TOKEN_TTL_HOURS", "-3")]).is_err());
        assert!(load(&[("TOKEN_TTL_HOURS", "10000000000")]).is_err());
        assert!(load(&[("TOKEN_TTL_HOURS", "9999999999999")]).is_err());

        let max = MAX_TOKEN_TTL_HOURS.to_string();
        let config = load(&[("TOKEN_TTL_HOURS", max.as_str())]).unwrap();
        assert_eq!(config.token_ttl.num_hours(), MAX_TOKEN_TTL_HOURS);
    }

    #[test]
    fn longest_ttl_still_issues_tokens() {
        let max = MAX_TOKEN_TTL_HOURS.to_string();
        let config = load(&[("TOKEN_TTL_HOURS", max.as_str())]).unwrap();
        let tokens = crate::auth::TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl);
        let token = tokens.issue("user-1", "alice", crate::auth::Role::User).unwrap();
        assert_eq!(tokens.validate(&token).unwrap().sub, "user-1");
    }

    #[test]
    fn token_leeway_is_bounded() {
        assert!(load(&[("TOKEN_LEEWAY_SECS", "301")]).is_err());
        assert!(load(&[("TOKEN_LEEWAY_SECS", "-1")]).is_err());
        assert_eq!(load(&[("TOKEN_LEEWAY_SECS", "300")]).unwrap().token_leeway_secs, 300);
    }

    #[test]
    fn debug_redacts_secret() {
        let config = load(&[("JWT_SECRET", "do-not-print-me")]).unwrap();
        assert!(!format!("{config:?}").contains("do-not-print-me"));
    }
}
