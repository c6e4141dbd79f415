// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim sets and the typed values attached to requests and responses.

use std::convert::Infallible;

use axum::response::{IntoResponseParts, ResponseParts};
use serde_json::{Map, Value};

use super::error::RejectReason;

/// Decoded token payload: claim name to arbitrary JSON value.
///
/// No defaults are filled in; a missing `aud`, `iss` or `exp` stays missing.
pub type ClaimSet = Map<String, Value>;

/// Outcome of verifying the credential carried by a request.
///
/// Attached to every request that passes through the middleware as a request
/// extension. A rejected header credential either short-circuits the request
/// or fails it, so downstream handlers only ever observe `Verified` or
/// `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Token verified; these are its claims
    Verified(ClaimSet),
    /// Token presented but not accepted
    Rejected(RejectReason),
    /// No credential supplied, or an invalid cookie was ignored
    Absent,
}

impl Verification {
    /// The authenticated claims, or none.
    pub fn claims(&self) -> Option<&ClaimSet> {
        match self {
            Verification::Verified(claims) => Some(claims),
            Verification::Rejected(_) | Verification::Absent => None,
        }
    }

    pub fn into_claims(self) -> Option<ClaimSet> {
        match self {
            Verification::Verified(claims) => Some(claims),
            Verification::Rejected(_) | Verification::Absent => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified(_))
    }
}

/// Cookie action requested by a handler, set as a response extension.
///
/// ```rust,ignore
/// async fn login() -> impl IntoResponse {
///     let mut claims = ClaimSet::new();
///     claims.insert("sub".into(), "user_123".into());
///     (Issuance::Encode(claims), "welcome")
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Issuance {
    /// Sign these claims and set them as the session cookie
    Encode(ClaimSet),
    /// Delete the session cookie
    Clear,
}

impl From<Option<ClaimSet>> for Issuance {
    fn from(claims: Option<ClaimSet>) -> Self {
        match claims {
            Some(claims) => Issuance::Encode(claims),
            None => Issuance::Clear,
        }
    }
}

impl IntoResponseParts for Issuance {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.extensions_mut().insert(self);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kyle() -> ClaimSet {
        let mut claims = ClaimSet::new();
        claims.insert("name".into(), json!("Kyle"));
        claims
    }

    #[test]
    fn only_verified_exposes_claims() {
        assert_eq!(Verification::Verified(kyle()).claims(), Some(&kyle()));
        assert_eq!(Verification::Absent.claims(), None);
        assert_eq!(
            Verification::Rejected(RejectReason::Expired).into_claims(),
            None
        );
    }

    #[test]
    fn issuance_from_none_clears() {
        assert_eq!(Issuance::from(None), Issuance::Clear);
        assert_eq!(Issuance::from(Some(kyle())), Issuance::Encode(kyle()));
    }
}
