// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! - The whole key set is cached and replaced atomically on refresh
//! - The cache is fresh for one hour by default
//! - Concurrent callers that find the cache stale share a single fetch
//! - Fetch or parse failures are hard failures; a stale set is never served
//! - Entries of unsupported key types are dropped, not fatal

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use url::Url;

use super::error::{AuthError, RejectReason};
use crate::config::DEFAULT_JWKS_CACHE_TTL;

/// Upper bound on a single key set request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JWKS cache entry.
struct CacheEntry {
    jwks: Arc<JwkSet>,
    fetched_at: Instant,
}

/// JWKS manager with caching.
pub struct JwksManager {
    /// JWKS endpoint
    jwks_url: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached JWKS
    cache: RwLock<Option<CacheEntry>>,
    /// Held for the duration of a fetch-and-swap
    refresh_lock: Mutex<()>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL (e.g., `https://issuer.example/.well-known/jwks.json`)
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] if the URL is not an `http(s)` URL
    /// or the HTTP client cannot be built.
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, AuthError> {
        let jwks_url = jwks_url.into();
        let parsed = Url::parse(&jwks_url)
            .map_err(|e| AuthError::Configuration(format!("invalid JWKS URL `{jwks_url}`: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AuthError::Configuration(format!(
                "JWKS URL must use http or https, got `{}`",
                parsed.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            jwks_url,
            cache_ttl: DEFAULT_JWKS_CACHE_TTL,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            client,
        })
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch JWKS (with caching).
    pub async fn get_jwks(&self) -> Result<Arc<JwkSet>, AuthError> {
        if let Some(jwks) = self.fresh().await {
            debug!(jwks_url = %self.jwks_url, "JWKS cache hit");
            return Ok(jwks);
        }

        let _guard = self.refresh_lock.lock().await;

        // Someone else may have refreshed while we waited for the lock.
        if let Some(jwks) = self.fresh().await {
            return Ok(jwks);
        }

        self.refresh_locked().await
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await.map(|_| ())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        self.fresh().await.is_some()
    }

    /// Find the signing key for `kid` declared for `alg`.
    ///
    /// Entries whose `use` is not `sig`, or whose declared `alg` differs, are
    /// skipped. The first remaining entry with a matching `kid` wins.
    pub async fn find_key(
        &self,
        kid: &str,
        alg: Algorithm,
    ) -> Result<(Algorithm, DecodingKey), AuthError> {
        let jwks = self.get_jwks().await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|jwk| is_signing_key_for(jwk, kid, alg))
            .ok_or_else(|| RejectReason::invalid("unknown key"))?;

        let key = DecodingKey::from_jwk(jwk).map_err(|e| {
            AuthError::RemoteFetch(format!("unusable key material for kid `{kid}`: {e}"))
        })?;

        Ok((alg, key))
    }

    async fn fresh(&self) -> Option<Arc<JwkSet>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| Arc::clone(&entry.jwks))
    }

    /// Caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<Arc<JwkSet>, AuthError> {
        let jwks = Arc::new(self.fetch_jwks().await?);

        {
            let mut cache = self.cache.write().await;
            *cache = Some(CacheEntry {
                jwks: Arc::clone(&jwks),
                fetched_at: Instant::now(),
            });
        }

        info!(
            jwks_url = %self.jwks_url,
            keys = jwks.keys.len(),
            "JWKS refreshed"
        );

        Ok(jwks)
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::RemoteFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::RemoteFetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let document = response
            .json::<RawJwkSet>()
            .await
            .map_err(|e| AuthError::RemoteFetch(e.to_string()))?;

        Ok(document.into_jwk_set())
    }
}

/// Key set document with entries left unparsed.
#[derive(Deserialize)]
struct RawJwkSet {
    keys: Vec<serde_json::Value>,
}

impl RawJwkSet {
    /// Keep the entries `Jwk` can represent; unsupported key types are skipped.
    fn into_jwk_set(self) -> JwkSet {
        let keys = self
            .keys
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Jwk>(entry) {
                Ok(jwk) => Some(jwk),
                Err(e) => {
                    debug!(error = %e, "Skipping unsupported JWKS entry");
                    None
                }
            })
            .collect();
        JwkSet { keys }
    }
}

fn is_signing_key_for(jwk: &Jwk, kid: &str, alg: Algorithm) -> bool {
    jwk.common.key_id.as_deref() == Some(kid)
        && matches!(jwk.common.public_key_use, Some(PublicKeyUse::Signature))
        && jwk.common.key_algorithm.as_ref().and_then(signing_algorithm) == Some(alg)
}

/// Map a JWK `alg` to a signature algorithm; encryption algorithms map to none.
fn signing_algorithm(alg: &KeyAlgorithm) -> Option<Algorithm> {
    match alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}
