// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `API_HOST` | API listener address | `0.0.0.0:3000` |
//! | `DEBUG_HOST` | Debug listener address | `0.0.0.0:4000` |
//! | `WRITE_TIMEOUT` | Request timeout in seconds | `10` |
//! | `SHUTDOWN_TIMEOUT` | Graceful shutdown grace period in seconds | `20` |
//! | `KEYS_FOLDER` | Directory of `<kid>.pem` signing keys | `zarf/keys` |
//! | `ACTIVE_KID` | Key id used to sign new tokens | Required |
//! | `BUILD_VERSION` | Build tag reported by liveness | `develop` |
//! | `TLS_CERT_PATH` | PEM certificate chain, enables TLS with `TLS_KEY_PATH` | Optional |
//! | `TLS_KEY_PATH` | PEM private key for TLS | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `SEED_ADMIN_EMAIL` | Seed an ADMIN user into the in-memory store | Optional |
//! | `SEED_ADMIN_PASSWORD` | Password for the seeded admin | Optional |
//! | `RUST_LOG` | Log level filter | `info` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const API_HOST_ENV: &str = "API_HOST";
pub const DEBUG_HOST_ENV: &str = "DEBUG_HOST";
pub const WRITE_TIMEOUT_ENV: &str = "WRITE_TIMEOUT";
pub const SHUTDOWN_TIMEOUT_ENV: &str = "SHUTDOWN_TIMEOUT";
pub const KEYS_FOLDER_ENV: &str = "KEYS_FOLDER";
pub const ACTIVE_KID_ENV: &str = "ACTIVE_KID";
pub const BUILD_VERSION_ENV: &str = "BUILD_VERSION";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";

pub const DEFAULT_API_HOST: &str = "0.0.0.0:3000";
pub const DEFAULT_DEBUG_HOST: &str = "0.0.0.0:4000";
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_KEYS_FOLDER: &str = "zarf/keys";
pub const DEFAULT_BUILD_VERSION: &str = "develop";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_host: SocketAddr,
    pub debug_host: SocketAddr,
    pub write_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub keys_folder: PathBuf,
    pub active_kid: String,
    pub build: String,
    pub tls: Option<TlsConfig>,
    pub log_format: LogFormat,
    pub seed_admin: Option<SeedAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let active_kid = get(ACTIVE_KID_ENV).ok_or(ConfigError::Missing(ACTIVE_KID_ENV))?;

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            _ => None,
        };

        let seed_admin = match (get(SEED_ADMIN_EMAIL_ENV), get(SEED_ADMIN_PASSWORD_ENV)) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            _ => None,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            api_host: parse(API_HOST_ENV, get(API_HOST_ENV), DEFAULT_API_HOST)?,
            debug_host: parse(DEBUG_HOST_ENV, get(DEBUG_HOST_ENV), DEFAULT_DEBUG_HOST)?,
            write_timeout: seconds(WRITE_TIMEOUT_ENV, get(WRITE_TIMEOUT_ENV), DEFAULT_WRITE_TIMEOUT_SECS)?,
            shutdown_timeout: seconds(
                SHUTDOWN_TIMEOUT_ENV,
                get(SHUTDOWN_TIMEOUT_ENV),
                DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            )?,
            keys_folder: get(KEYS_FOLDER_ENV)
                .unwrap_or_else(|| DEFAULT_KEYS_FOLDER.to_string())
                .into(),
            active_kid,
            build: get(BUILD_VERSION_ENV).unwrap_or_else(|| DEFAULT_BUILD_VERSION.to_string()),
            tls,
            log_format,
            seed_admin,
        })
    }
}

fn parse<T>(var: &'static str, value: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = value.unwrap_or_else(|| default.to_string());
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}

fn seconds(var: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let secs: u64 = parse(var, value, &default.to_string())?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[(ACTIVE_KID_ENV, "k1")]).unwrap();
        assert_eq!(cfg.api_host, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(cfg.debug_host, "0.0.0.0:4000".parse().unwrap());
        assert_eq!(cfg.write_timeout, Duration::from_secs(10));
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(20));
        assert_eq!(cfg.keys_folder, PathBuf::from("zarf/keys"));
        assert_eq!(cfg.build, "develop");
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(cfg.tls.is_none());
        assert!(cfg.seed_admin.is_none());
    }

    #[test]
    fn active_kid_is_required() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing(ACTIVE_KID_ENV))));
        assert!(matches!(
            config(&[(ACTIVE_KID_ENV, "  ")]),
            Err(ConfigError::Missing(ACTIVE_KID_ENV))
        ));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config(&[(ACTIVE_KID_ENV, "k1"), (SHUTDOWN_TIMEOUT_ENV, "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: SHUTDOWN_TIMEOUT_ENV, .. }));
        assert!(err.to_string().starts_with("SHUTDOWN_TIMEOUT"));

        let err = config(&[(ACTIVE_KID_ENV, "k1"), (API_HOST_ENV, "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: API_HOST_ENV, .. }));
    }

    #[test]
    fn overrides_apply() {
        let cfg = config(&[
            (ACTIVE_KID_ENV, "2024"),
            (API_HOST_ENV, "127.0.0.1:8080"),
            (WRITE_TIMEOUT_ENV, "3"),
            (KEYS_FOLDER_ENV, "/etc/gatehouse/keys"),
            (LOG_FORMAT_ENV, "JSON"),
            (TLS_CERT_PATH_ENV, "/tls/cert.pem"),
            (TLS_KEY_PATH_ENV, "/tls/key.pem"),
            (SEED_ADMIN_EMAIL_ENV, "admin@example.com"),
            (SEED_ADMIN_PASSWORD_ENV, "gophers"),
        ])
        .unwrap();

        assert_eq!(cfg.active_kid, "2024");
        assert_eq!(cfg.api_host.port(), 8080);
        assert_eq!(cfg.write_timeout, Duration::from_secs(3));
        assert_eq!(cfg.keys_folder, PathBuf::from("/etc/gatehouse/keys"));
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.tls.unwrap().cert_path, PathBuf::from("/tls/cert.pem"));
        assert_eq!(cfg.seed_admin.unwrap().email, "admin@example.com");
    }

    #[test]
    fn tls_needs_both_paths() {
        let cfg = config(&[(ACTIVE_KID_ENV, "k1"), (TLS_CERT_PATH_ENV, "/tls/cert.pem")]).unwrap();
        assert!(cfg.tls.is_none());
    }
}
