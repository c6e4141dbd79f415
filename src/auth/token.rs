// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact JWT encoding and verification on top of `jsonwebtoken`.

use std::collections::HashSet;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;

use super::claims::ClaimSet;
use super::error::{AuthError, RejectReason};

/// Header fields read before the signature is checked.
///
/// Only used to pick a key; nothing here is trusted.
#[derive(Debug, Default, Deserialize)]
pub struct UnverifiedHeader {
    pub kid: Option<String>,
    pub alg: Option<String>,
}

/// Read the header of a compact token without verifying it.
pub fn peek_header(token: &str) -> Result<UnverifiedHeader, RejectReason> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(RejectReason::invalid("malformed token"));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| RejectReason::invalid("malformed header"))?;
    serde_json::from_slice(&bytes).map_err(|_| RejectReason::invalid("malformed header"))
}

/// Claim checks applied after the signature verifies.
#[derive(Debug, Clone, Default)]
pub struct ClaimRules {
    /// Accepted audiences; `None` skips the check
    pub audience: Option<Vec<String>>,
    /// Expected issuer; `None` skips the check
    pub issuer: Option<String>,
    /// Clock skew tolerance in seconds for `exp` and `nbf`
    pub leeway: u64,
}

impl ClaimRules {
    fn validation(&self, algorithms: &[Algorithm]) -> Result<Validation, AuthError> {
        let first = algorithms
            .first()
            .copied()
            .ok_or_else(|| AuthError::Configuration("no algorithms configured".to_string()))?;

        let mut validation = Validation::new(first);
        validation.algorithms = algorithms.to_vec();
        // `exp` and `nbf` are enforced only when present.
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = self.leeway;

        // A configured audience or issuer also makes the claim mandatory.
        match &self.audience {
            Some(audience) => {
                validation.set_audience(audience.as_slice());
                validation.required_spec_claims.insert("aud".to_string());
            }
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_string());
        }

        Ok(validation)
    }
}

/// Verify `token` against `key` with one of `algorithms` and return its claims.
pub fn verify_token(
    token: &str,
    key: &DecodingKey,
    algorithms: &[Algorithm],
    rules: &ClaimRules,
) -> Result<ClaimSet, AuthError> {
    let validation = rules.validation(algorithms)?;
    let data = decode::<ClaimSet>(token, key, &validation)
        .map_err(|e| AuthError::Rejected(RejectReason::from(&e)))?;
    Ok(data.claims)
}

/// Sign `claims` with a shared secret.
pub fn sign_claims(claims: &ClaimSet, algorithm: Algorithm, secret: &[u8]) -> Result<String, AuthError> {
    encode(
        &Header::new(algorithm),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Encoding(e.to_string()))
}
