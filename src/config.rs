// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AppConfig`] loaded from the environment at startup. Missing required
//! variables abort startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CLERK_JWKS_URL` | Clerk JWKS endpoint for JWT verification | Required |
//! | `CLERK_ISSUER` | Expected JWT issuer claim | Required |
//! | `CLERK_AUDIENCE` | Expected JWT audience claim (falls back to `CLERK_PUBLISHABLE_KEY`) | Required |
//! | `HOST` | Server bind IP address (IPv4 or IPv6) | `0.0.0.0` |
//! | `PORT` | Server bind port | `8000` |
//! | `JWKS_CACHE_TTL_SECS` | Lifetime of a fetched key set | `300` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for `exp`/`nbf` | `60` |
//! | `ADMIN_EMAIL_SUFFIX` | Email suffix granting access to admin routes | `@admin.com` |
//! | `CORS_ALLOWED_ORIGINS` | Comma separated list of allowed origins | `http://localhost:3000,https://localhost:3000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

use crate::auth::cache::DEFAULT_CACHE_TTL;

/// Clerk JWKS endpoint (`https://<instance>.clerk.accounts.dev/.well-known/jwks.json`).
pub const CLERK_JWKS_URL_ENV: &str = "CLERK_JWKS_URL";
/// Expected `iss` claim, usually the Clerk instance URL.
pub const CLERK_ISSUER_ENV: &str = "CLERK_ISSUER";
/// Expected `aud` claim.
pub const CLERK_AUDIENCE_ENV: &str = "CLERK_AUDIENCE";
/// Legacy name for the audience value.
pub const CLERK_PUBLISHABLE_KEY_ENV: &str = "CLERK_PUBLISHABLE_KEY";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const ADMIN_EMAIL_SUFFIX_ENV: &str = "ADMIN_EMAIL_SUFFIX";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
/// Logging format selector, read by [`crate::logging::init`].
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LEEWAY_SECS: u64 = 60;
pub const DEFAULT_ADMIN_EMAIL_SUFFIX: &str = "@admin.com";
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "https://localhost:3000"];

/// Configuration errors raised while loading [`AppConfig`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings for token verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub jwks_url: Url,
    pub issuer: String,
    pub audience: String,
    pub cache_ttl: Duration,
    pub leeway_secs: u64,
}

/// Full service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub auth: AuthSettings,
    pub admin_email_suffix: String,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwks_url_raw = get(CLERK_JWKS_URL_ENV).ok_or(ConfigError::Missing(CLERK_JWKS_URL_ENV))?;
        let jwks_url = parse_jwks_url(&jwks_url_raw)?;
        let issuer = get(CLERK_ISSUER_ENV).ok_or(ConfigError::Missing(CLERK_ISSUER_ENV))?;
        let audience = get(CLERK_AUDIENCE_ENV)
            .or_else(|| get(CLERK_PUBLISHABLE_KEY_ENV))
            .ok_or(ConfigError::Missing(CLERK_AUDIENCE_ENV))?;

        let cache_ttl = match get(JWKS_CACHE_TTL_ENV) {
            Some(raw) => Duration::from_secs(parse_number(JWKS_CACHE_TTL_ENV, &raw)?),
            None => DEFAULT_CACHE_TTL,
        };
        let leeway_secs = match get(JWT_LEEWAY_ENV) {
            Some(raw) => parse_number(JWT_LEEWAY_ENV, &raw)?,
            None => DEFAULT_LEEWAY_SECS,
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let ip: IpAddr = host.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            name: HOST_ENV,
            reason: e.to_string(),
        })?;
        let addr = SocketAddr::new(ip, port);

        let admin_email_suffix =
            get(ADMIN_EMAIL_SUFFIX_ENV).unwrap_or_else(|| DEFAULT_ADMIN_EMAIL_SUFFIX.to_string());

        let cors_allowed_origins = match get(CORS_ALLOWED_ORIGINS_ENV) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            addr,
            auth: AuthSettings {
                jwks_url,
                issuer,
                audience,
                cache_ttl,
                leeway_secs,
            },
            admin_email_suffix,
            cors_allowed_origins,
        })
    }
}

/// JWKS must be fetched over HTTPS; plain HTTP is only accepted for loopback hosts.
fn parse_jwks_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name: CLERK_JWKS_URL_ENV,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback(&url) => Ok(url),
        other => Err(ConfigError::Invalid {
            name: CLERK_JWKS_URL_ENV,
            reason: format!("scheme '{other}' is not allowed, use https"),
        }),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(d)) => d == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

fn parse_number(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
