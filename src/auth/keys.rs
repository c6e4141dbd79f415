// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key resolution: which key and algorithms verify a given token.
//!
//! A static shared secret always wins. Without one, the token's unverified
//! `kid` and `alg` select an entry from the remote key set.

use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey};

use super::error::{AuthError, RejectReason};
use super::jwks::JwksManager;
use super::token::peek_header;
use crate::config::JwtConfig;

pub struct KeyResolver {
    algorithms: Vec<Algorithm>,
    secret: Option<Vec<u8>>,
    jwks: Option<JwksManager>,
}

impl KeyResolver {
    /// Build a resolver from configuration.
    ///
    /// Having neither a secret nor a JWKS endpoint is not an error here; it
    /// surfaces as [`AuthError::Configuration`] on the first resolution.
    pub fn new(config: &JwtConfig) -> Result<Self, AuthError> {
        let jwks = match (&config.key, &config.jwks_uri) {
            (None, Some(uri)) => Some(JwksManager::new(uri)?.with_cache_ttl(config.jwks_cache_ttl)),
            _ => None,
        };

        Ok(Self {
            algorithms: config.algorithms.clone(),
            secret: config.key.clone(),
            jwks,
        })
    }

    /// The remote key set, when keys are resolved remotely.
    pub fn jwks(&self) -> Option<&JwksManager> {
        self.jwks.as_ref()
    }

    /// Resolve the allowed algorithms and verification key for `token`.
    pub async fn resolve(&self, token: &str) -> Result<(Vec<Algorithm>, DecodingKey), AuthError> {
        if let Some(secret) = &self.secret {
            return Ok((self.algorithms.clone(), DecodingKey::from_secret(secret)));
        }

        let jwks = self.jwks.as_ref().ok_or_else(missing_key_material)?;

        let header = peek_header(token)?;
        let kid = header.kid.ok_or_else(|| RejectReason::invalid("missing kid"))?;
        let alg = header.alg.ok_or_else(|| RejectReason::invalid("missing alg"))?;
        let alg = Algorithm::from_str(&alg).map_err(|_| RejectReason::invalid("unknown key"))?;

        let (alg, key) = jwks.find_key(&kid, alg).await?;
        Ok((vec![alg], key))
    }

    /// The shared secret used to sign issued tokens.
    pub fn signing_secret(&self) -> Result<&[u8], AuthError> {
        self.secret
            .as_deref()
            .ok_or_else(|| AuthError::Configuration("missing signing key".to_string()))
    }
}

fn missing_key_material() -> AuthError {
    AuthError::Configuration("neither a static key nor a JWKS URL is configured".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::tests::{oct_jwk, serve_jwks};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn token_with_header(header: &str) -> String {
        format!("{}.e30.c2ln", URL_SAFE_NO_PAD.encode(header.as_bytes()))
    }

    async fn rejection(resolver: &KeyResolver, token: &str) -> RejectReason {
        match resolver.resolve(token).await {
            Err(AuthError::Rejected(reason)) => reason,
            Err(other) => panic!("expected rejection, got {other:?}"),
            Ok(_) => panic!("expected rejection, got a key"),
        }
    }

    #[tokio::test]
    async fn static_key_skips_header_inspection() {
        let resolver = KeyResolver::new(
            &JwtConfig::with_secret("secret").with_algorithms([Algorithm::HS256, Algorithm::HS384]),
        )
        .unwrap();

        let (algorithms, _key) = resolver.resolve("not even a token").await.unwrap();
        assert_eq!(algorithms, vec![Algorithm::HS256, Algorithm::HS384]);
    }

    #[tokio::test]
    async fn static_key_wins_over_jwks() {
        let resolver = KeyResolver::new(
            &JwtConfig::with_secret("secret").with_jwks_uri("https://issuer.example/jwks"),
        )
        .unwrap();

        assert!(resolver.jwks().is_none());
        assert!(resolver.resolve("x.y.z").await.is_ok());
    }

    #[tokio::test]
    async fn no_key_material_is_configuration_error() {
        let resolver = KeyResolver::new(&JwtConfig::default()).unwrap();

        assert!(matches!(
            resolver.resolve("x.y.z").await,
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            resolver.signing_secret(),
            Err(AuthError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn remote_resolution_requires_kid_and_alg() {
        let resolver = KeyResolver::new(&JwtConfig::with_jwks("https://issuer.example/jwks")).unwrap();

        assert_eq!(
            rejection(&resolver, &token_with_header(r#"{"alg":"HS256"}"#)).await,
            RejectReason::invalid("missing kid")
        );
        assert_eq!(
            rejection(&resolver, &token_with_header(r#"{"kid":"k1"}"#)).await,
            RejectReason::invalid("missing alg")
        );
    }

    #[tokio::test]
    async fn remote_resolution_uses_entry_algorithm() {
        let server = serve_jwks(vec![oct_jwk("k1", "sig", "HS384")], 1).await;
        let resolver = KeyResolver::new(&JwtConfig::with_jwks(format!("{}/jwks", server.uri()))).unwrap();

        let token = token_with_header(r#"{"alg":"HS384","kid":"k1"}"#);
        let (algorithms, _key) = resolver.resolve(&token).await.unwrap();
        assert_eq!(algorithms, vec![Algorithm::HS384]);
    }

    #[tokio::test]
    async fn remote_resolution_rejects_alg_mismatch() {
        let server = serve_jwks(vec![oct_jwk("k1", "sig", "HS384")], 1).await;
        let resolver = KeyResolver::new(&JwtConfig::with_jwks(format!("{}/jwks", server.uri()))).unwrap();

        let token = token_with_header(r#"{"alg":"HS256","kid":"k1"}"#);
        assert_eq!(
            rejection(&resolver, &token).await,
            RejectReason::invalid("unknown key")
        );
    }
}
