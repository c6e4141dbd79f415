// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! [`JwtConfig`] holds the immutable settings of one authentication layer.
//! It can be assembled with the `with_*` builder methods or loaded from the
//! environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_ALGORITHMS` | Comma-separated allowed algorithms, first one signs | `HS256` |
//! | `JWT_SECRET` | Static shared secret | unset |
//! | `JWT_JWKS_URL` | JWKS endpoint for remote key resolution | unset |
//! | `JWT_AUDIENCE` | Comma-separated accepted audiences | unset (not checked) |
//! | `JWT_ISSUER` | Expected issuer | unset (not checked) |
//! | `JWT_COOKIE_NAME` | Session cookie name | `jwt` |
//! | `JWT_COOKIE_SECURE` | Mark issued cookies `Secure` | `false` |
//! | `JWT_HEADER_NAME` | Header carrying `<scheme> <token>` | `Authorization` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for `exp`/`nbf` | `0` |
//! | `HOST` | Demo server bind address | `0.0.0.0` |
//! | `PORT` | Demo server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::auth::AuthError;

pub const ALGORITHMS_ENV: &str = "JWT_ALGORITHMS";
pub const SECRET_ENV: &str = "JWT_SECRET";
pub const JWKS_URL_ENV: &str = "JWT_JWKS_URL";
pub const AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const ISSUER_ENV: &str = "JWT_ISSUER";
pub const COOKIE_NAME_ENV: &str = "JWT_COOKIE_NAME";
pub const COOKIE_SECURE_ENV: &str = "JWT_COOKIE_SECURE";
pub const HEADER_NAME_ENV: &str = "JWT_HEADER_NAME";
pub const LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";

pub const DEFAULT_COOKIE_NAME: &str = "jwt";
pub const DEFAULT_HEADER_NAME: &str = "Authorization";

/// How long a fetched key set stays fresh.
pub const DEFAULT_JWKS_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Verification and issuance settings.
#[derive(Clone)]
pub struct JwtConfig {
    /// Allowed algorithms; the first one is used for signing
    pub algorithms: Vec<Algorithm>,
    /// Static shared secret, takes precedence over `jwks_uri`
    pub key: Option<Vec<u8>>,
    /// Remote key set endpoint
    pub jwks_uri: Option<String>,
    /// Accepted audiences (`None` = not checked)
    pub audience: Option<Vec<String>>,
    /// Expected issuer (`None` = not checked)
    pub issuer: Option<String>,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub header_name: String,
    /// Clock skew tolerance in seconds
    pub leeway: u64,
    pub jwks_cache_ttl: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithms: vec![Algorithm::HS256],
            key: None,
            jwks_uri: None,
            audience: None,
            issuer: None,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            header_name: DEFAULT_HEADER_NAME.to_string(),
            leeway: 0,
            jwks_cache_ttl: DEFAULT_JWKS_CACHE_TTL,
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithms", &self.algorithms)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("jwks_uri", &self.jwks_uri)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("header_name", &self.header_name)
            .field("leeway", &self.leeway)
            .field("jwks_cache_ttl", &self.jwks_cache_ttl)
            .finish()
    }
}

impl JwtConfig {
    /// Configuration with a static shared secret.
    pub fn with_secret(key: impl AsRef<[u8]>) -> Self {
        Self::default().with_key(key)
    }

    /// Configuration resolving keys from a JWKS endpoint.
    pub fn with_jwks(jwks_uri: impl Into<String>) -> Self {
        Self::default().with_jwks_uri(jwks_uri)
    }

    pub fn with_key(mut self, key: impl AsRef<[u8]>) -> Self {
        self.key = Some(key.as_ref().to_vec());
        self
    }

    pub fn with_jwks_uri(mut self, jwks_uri: impl Into<String>) -> Self {
        self.jwks_uri = Some(jwks_uri.into());
        self
    }

    pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.algorithms = algorithms.into_iter().collect();
        self
    }

    /// Set the accepted audiences. A token passes if its `aud` intersects them.
    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = Some(audience.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    pub fn with_jwks_cache_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_cache_ttl = ttl;
        self
    }

    /// The signing algorithm (first allowed one).
    pub fn signing_algorithm(&self) -> Result<Algorithm, AuthError> {
        self.algorithms
            .first()
            .copied()
            .ok_or_else(|| AuthError::Configuration("no algorithms configured".to_string()))
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ALGORITHMS_ENV) {
            config.algorithms = split_list(&raw)
                .map(|name| {
                    Algorithm::from_str(name).map_err(|_| {
                        AuthError::Configuration(format!("unknown algorithm `{name}`"))
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(secret) = lookup(SECRET_ENV).filter(|s| !s.is_empty()) {
            config.key = Some(secret.into_bytes());
        }
        config.jwks_uri = lookup(JWKS_URL_ENV).filter(|s| !s.is_empty());
        config.audience = lookup(AUDIENCE_ENV)
            .map(|raw| split_list(&raw).map(str::to_string).collect::<Vec<_>>())
            .filter(|aud| !aud.is_empty());
        config.issuer = lookup(ISSUER_ENV).filter(|s| !s.is_empty());
        if let Some(name) = lookup(COOKIE_NAME_ENV) {
            config.cookie_name = name;
        }
        if let Some(raw) = lookup(COOKIE_SECURE_ENV) {
            config.cookie_secure = parse_bool(&raw).ok_or_else(|| {
                AuthError::Configuration(format!("{COOKIE_SECURE_ENV} must be a boolean"))
            })?;
        }
        if let Some(name) = lookup(HEADER_NAME_ENV) {
            config.header_name = name;
        }
        if let Some(raw) = lookup(LEEWAY_ENV) {
            config.leeway = raw.trim().parse().map_err(|_| {
                AuthError::Configuration(format!("{LEEWAY_ENV} must be a number of seconds"))
            })?;
        }

        Ok(config)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
