// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the claims attached by [`jwt_middleware`].
//!
//! ```rust,ignore
//! async fn me(Claims(claims): Claims) -> Json<ClaimSet> {
//!     Json(claims)
//! }
//! ```
//!
//! [`jwt_middleware`]: super::middleware::jwt_middleware

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::{ClaimSet, Verification};
use super::error::AuthError;

/// Verified claims, rejecting with 401 when the request is unauthenticated.
pub struct Claims(pub ClaimSet);

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Verification>()
            .and_then(Verification::claims)
            .cloned()
            .map(Claims)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Optional authentication extractor.
///
/// Returns `None` if the request carried no valid credential.
pub struct OptionalClaims(pub Option<ClaimSet>);

impl<S> FromRequestParts<S> for OptionalClaims
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalClaims(
            parts
                .extensions
                .get::<Verification>()
                .and_then(Verification::claims)
                .cloned(),
        ))
    }
}
