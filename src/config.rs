// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Any invalid
//! value is fatal: a partially loaded access policy would silently leave
//! routes unprotected.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | HMAC secret for login and OTP tokens | Required |
//! | `ADMIN_ROLE_TAG` | Role tag that grants the admin area | `0` |
//! | `ADMIN_PATH_PREFIX` | Path prefix of the admin area | `/admin` |
//! | `ACCESS_RULES_FILE` | JSON rule table replacing the built-in rules | unset |
//! | `PUBLIC_ORIGIN` | Base URL used for redirect locations | from `Host` header |
//! | `COOKIE_SECURE` | Mark auth cookies `Secure` | `false` |
//! | `TOKEN_LEEWAY_SECS` | Seconds a token is accepted past `exp` | `0` |
//! | `FRONTEND_ORIGIN` | CORS origin allowed to send cookies | `http://localhost:3000` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::path::PathBuf;

use axum::http::HeaderValue;
use url::Url;

use crate::auth::{
    policy::{PolicyTable, RuleError, DEFAULT_ADMIN_PREFIX},
    roles::DEFAULT_ADMIN_ROLE_TAG,
    AccessGate, AccessPolicy, SessionGate, TokenCodec,
};

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const ADMIN_ROLE_TAG_ENV: &str = "ADMIN_ROLE_TAG";
pub const ADMIN_PATH_PREFIX_ENV: &str = "ADMIN_PATH_PREFIX";
pub const ACCESS_RULES_FILE_ENV: &str = "ACCESS_RULES_FILE";
pub const PUBLIC_ORIGIN_ENV: &str = "PUBLIC_ORIGIN";
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";
pub const TOKEN_LEEWAY_SECS_ENV: &str = "TOKEN_LEEWAY_SECS";
pub const FRONTEND_ORIGIN_ENV: &str = "FRONTEND_ORIGIN";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Startup configuration failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("access rules are invalid: {0}")]
    Rules(#[from] RuleError),
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

/// HMAC secret; never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Settings for the token codec, session gate and access policy.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: SigningSecret,
    pub admin_role_tag: String,
    pub admin_path_prefix: String,
    /// Replaces the built-in rule table (and `admin_path_prefix`) when set.
    pub rules_file: Option<PathBuf>,
    pub public_origin: Option<Url>,
    pub cookie_secure: bool,
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Defaults for everything except the secret.
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            admin_role_tag: DEFAULT_ADMIN_ROLE_TAG.to_string(),
            admin_path_prefix: DEFAULT_ADMIN_PREFIX.to_string(),
            rules_file: None,
            public_origin: None,
            cookie_secure: false,
            leeway_secs: 0,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(JWT_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let mut config = Self::new(SigningSecret::new(secret));

        if let Some(tag) = lookup(ADMIN_ROLE_TAG_ENV) {
            let tag = tag.trim();
            if tag.is_empty() {
                return Err(invalid(ADMIN_ROLE_TAG_ENV, "must not be empty"));
            }
            config.admin_role_tag = tag.to_string();
        }

        if let Some(prefix) = lookup(ADMIN_PATH_PREFIX_ENV) {
            config.admin_path_prefix = prefix.trim().to_string();
        }

        config.rules_file = lookup(ACCESS_RULES_FILE_ENV)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if let Some(origin) = lookup(PUBLIC_ORIGIN_ENV).filter(|s| !s.trim().is_empty()) {
            config.public_origin = Some(parse_origin(origin.trim())?);
        }

        if let Some(value) = lookup(COOKIE_SECURE_ENV) {
            config.cookie_secure = parse_bool(COOKIE_SECURE_ENV, &value)?;
        }

        if let Some(value) = lookup(TOKEN_LEEWAY_SECS_ENV) {
            config.leeway_secs = value
                .trim()
                .parse()
                .map_err(|e| invalid(TOKEN_LEEWAY_SECS_ENV, format!("{e}")))?;
        }

        Ok(config)
    }

    /// Rule table from `rules_file`, or the built-in rules.
    pub fn policy_table(&self) -> Result<PolicyTable, ConfigError> {
        let table = match &self.rules_file {
            Some(path) => PolicyTable::from_file(path)?,
            None => PolicyTable::with_admin_prefix(&self.admin_path_prefix)?,
        };
        Ok(table)
    }

    /// Assemble the request gate.
    pub fn build_gate(&self) -> Result<AccessGate, ConfigError> {
        let codec = TokenCodec::new(self.secret.as_bytes()).with_leeway(self.leeway_secs);
        let sessions = SessionGate::new(codec, self.admin_role_tag.clone());
        let policy = AccessPolicy::new(self.policy_table()?, self.admin_role_tag.clone());
        Ok(AccessGate::new(sessions, policy).with_public_origin(self.public_origin.clone()))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Listener, CORS and logging settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_origin: HeaderValue,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            frontend_origin: HeaderValue::from_static(DEFAULT_FRONTEND_ORIGIN),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_ENV).filter(|s| !s.trim().is_empty()) {
            config.host = host.trim().to_string();
        }

        if let Some(port) = lookup(PORT_ENV) {
            config.port = port
                .trim()
                .parse()
                .map_err(|e| invalid(PORT_ENV, format!("{e}")))?;
        }

        if let Some(origin) = lookup(FRONTEND_ORIGIN_ENV) {
            config.frontend_origin = HeaderValue::from_str(origin.trim())
                .map_err(|e| invalid(FRONTEND_ORIGIN_ENV, format!("{e}")))?;
        }

        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.log_format = match format.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "" => LogFormat::Pretty,
                other => return Err(invalid(LOG_FORMAT_ENV, format!("unknown format {other:?}"))),
            };
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origin(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| invalid(PUBLIC_ORIGIN_ENV, format!("{e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(PUBLIC_ORIGIN_ENV, "scheme must be http or https"));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(invalid(PUBLIC_ORIGIN_ENV, "must be an absolute URL with a host"));
    }
    Ok(url)
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(invalid(name, format!("expected a boolean, got {other:?}"))),
    }
}
