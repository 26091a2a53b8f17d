// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Invalid
//! values fail startup instead of falling back to defaults.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the database and deck content | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8000` |
//! | `JWT_SECRET` | HS256 signing secret, at least 32 bytes | Random per process |
//! | `TOKEN_TTL_HOURS` | Token lifetime | `24` |
//! | `ARGON2_MEMORY_KIB` | Argon2id memory cost | `19456` |
//! | `ARGON2_ITERATIONS` | Argon2id time cost | `2` |
//! | `ARGON2_PARALLELISM` | Argon2id lanes | `1` |
//! | `MAX_UPLOAD_BYTES` | Request body limit for uploads | `26214400` |
//! | `REQUIRE_PDF_SIGNATURE` | Reject uploads not starting with `%PDF-` | `true` |
//! | `ALLOW_BODY_TOKEN` | Accept a `token` multipart field on upload | `false` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated origins; empty allows any | empty |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables HTTPS | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::auth::password::{self, HashCost};
use crate::auth::tokens::DEFAULT_TOKEN_TTL_HOURS;
use crate::storage::paths::DATA_ROOT;

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const TOKEN_TTL_HOURS_ENV: &str = "TOKEN_TTL_HOURS";
pub const ARGON2_MEMORY_KIB_ENV: &str = "ARGON2_MEMORY_KIB";
pub const ARGON2_ITERATIONS_ENV: &str = "ARGON2_ITERATIONS";
pub const ARGON2_PARALLELISM_ENV: &str = "ARGON2_PARALLELISM";
pub const MAX_UPLOAD_BYTES_ENV: &str = "MAX_UPLOAD_BYTES";
pub const REQUIRE_PDF_SIGNATURE_ENV: &str = "REQUIRE_PDF_SIGNATURE";
pub const ALLOW_BODY_TOKEN_ENV: &str = "ALLOW_BODY_TOKEN";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Shortest accepted `JWT_SECRET`, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{JWT_SECRET_ENV} must be at least {MIN_JWT_SECRET_LEN} bytes (got {0})")]
    ShortSecret(usize),

    #[error("{TLS_CERT_PATH_ENV} and {TLS_KEY_PATH_ENV} must be set together")]
    PartialTls,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected `json` or `pretty`, got `{other}`")),
        }
    }
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Server configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// `None` means a random secret is generated at startup.
    pub jwt_secret: Option<Vec<u8>>,
    pub token_ttl_hours: i64,
    pub hash_cost: HashCost,
    pub max_upload_bytes: usize,
    pub require_pdf_signature: bool,
    pub allow_body_token: bool,
    /// Empty allows any origin.
    pub cors_allowed_origins: Vec<String>,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("data_dir", &self.data_dir)
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("hash_cost", &self.hash_cost)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("require_pdf_signature", &self.require_pdf_signature)
            .field("allow_body_token", &self.allow_body_token)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("tls", &self.tls)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DATA_ROOT),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            jwt_secret: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            hash_cost: HashCost::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            require_pdf_signature: true,
            allow_body_token: false,
            cors_allowed_origins: Vec::new(),
            tls: None,
            log_format: LogFormat::default(),
        }
    }
}

/// Parse `var` if set and non-empty, otherwise use `default`.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                value,
                reason: "expected true or false".to_string(),
            }),
        },
        None => Ok(default),
    }
}

fn invalid(var: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DATA_ROOT));

        let host = lookup(HOST_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr = format!("{}:{port}", host.trim())
            .parse::<SocketAddr>()
            .map_err(|e| invalid(HOST_ENV, &host, &e.to_string()))?;

        let jwt_secret = match lookup(JWT_SECRET_ENV).filter(|v| !v.is_empty()) {
            Some(secret) if secret.len() < MIN_JWT_SECRET_LEN => {
                return Err(ConfigError::ShortSecret(secret.len()));
            }
            Some(secret) => Some(secret.into_bytes()),
            None => None,
        };

        let token_ttl_hours: i64 = parse_or(&lookup, TOKEN_TTL_HOURS_ENV, DEFAULT_TOKEN_TTL_HOURS)?;
        if token_ttl_hours <= 0 {
            return Err(invalid(TOKEN_TTL_HOURS_ENV, token_ttl_hours, "must be positive"));
        }

        let hash_cost = HashCost {
            memory_kib: parse_or(&lookup, ARGON2_MEMORY_KIB_ENV, password::DEFAULT_MEMORY_KIB)?,
            iterations: parse_or(&lookup, ARGON2_ITERATIONS_ENV, password::DEFAULT_ITERATIONS)?,
            parallelism: parse_or(&lookup, ARGON2_PARALLELISM_ENV, password::DEFAULT_PARALLELISM)?,
        };

        let max_upload_bytes: usize =
            parse_or(&lookup, MAX_UPLOAD_BYTES_ENV, DEFAULT_MAX_UPLOAD_BYTES)?;
        if max_upload_bytes == 0 {
            return Err(invalid(MAX_UPLOAD_BYTES_ENV, 0, "must be positive"));
        }

        let cors_allowed_origins = lookup(CORS_ALLOWED_ORIGINS_ENV)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let cert = lookup(TLS_CERT_PATH_ENV).filter(|v| !v.trim().is_empty());
        let key = lookup(TLS_KEY_PATH_ENV).filter(|v| !v.trim().is_empty());
        let tls = match (cert, key) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        Ok(Self {
            data_dir,
            bind_addr,
            jwt_secret,
            token_ttl_hours,
            hash_cost,
            max_upload_bytes,
            require_pdf_signature: parse_bool(&lookup, REQUIRE_PDF_SIGNATURE_ENV, true)?,
            allow_body_token: parse_bool(&lookup, ALLOW_BODY_TOKEN_ENV, false)?,
            cors_allowed_origins,
            tls,
            log_format: parse_or(&lookup, LOG_FORMAT_ENV, LogFormat::default())?,
        })
    }
}
