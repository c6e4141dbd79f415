// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Two families live here. A [`RejectReason`] describes why untrusted input
//! (a presented token) failed verification. Every other [`AuthError`] variant
//! is a hard failure caused by configuration or infrastructure, and is never
//! downgraded to "unauthenticated".

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::errors::ErrorKind;
use serde::Serialize;
use thiserror::Error;

/// Why a presented token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Structurally invalid token, missing header fields, or unknown key
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// Signature does not verify against the resolved key
    #[error("bad signature")]
    BadSignature,
    /// `exp` is in the past
    #[error("token has expired")]
    Expired,
    /// `nbf` is in the future
    #[error("token is not yet valid")]
    NotYetValid,
    /// `aud` does not intersect the accepted audiences
    #[error("audience mismatch")]
    AudienceMismatch,
    /// `iss` differs from the expected issuer
    #[error("issuer mismatch")]
    IssuerMismatch,
    /// A claim required by configuration is absent
    #[error("missing required claim: {0}")]
    MissingClaim(String),
    /// Header `alg` is not in the allow-list
    #[error("algorithm not allowed")]
    AlgorithmNotAllowed,
}

impl RejectReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InvalidToken(_) => "invalid_token",
            RejectReason::BadSignature => "bad_signature",
            RejectReason::Expired => "expired",
            RejectReason::NotYetValid => "not_yet_valid",
            RejectReason::AudienceMismatch => "audience_mismatch",
            RejectReason::IssuerMismatch => "issuer_mismatch",
            RejectReason::MissingClaim(_) => "missing_required_claim",
            RejectReason::AlgorithmNotAllowed => "algorithm_not_allowed",
        }
    }

    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        RejectReason::InvalidToken(detail.into())
    }
}

impl From<&jsonwebtoken::errors::Error> for RejectReason {
    fn from(err: &jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => RejectReason::Expired,
            ErrorKind::ImmatureSignature => RejectReason::NotYetValid,
            ErrorKind::InvalidSignature => RejectReason::BadSignature,
            ErrorKind::InvalidAudience => RejectReason::AudienceMismatch,
            ErrorKind::InvalidIssuer => RejectReason::IssuerMismatch,
            ErrorKind::MissingRequiredClaim(claim) => RejectReason::MissingClaim(claim.clone()),
            ErrorKind::InvalidAlgorithm => RejectReason::AlgorithmNotAllowed,
            _ => RejectReason::invalid("malformed token"),
        }
    }
}

/// Authentication error type.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable key material or otherwise unusable settings
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Presented credential failed verification
    #[error("{0}")]
    Rejected(#[from] RejectReason),
    /// Key set could not be fetched or parsed
    #[error("failed to fetch key set: {0}")]
    RemoteFetch(String),
    /// Outgoing token or cookie could not be produced
    #[error("failed to issue token: {0}")]
    Encoding(String),
    /// A handler required claims but the request carried none
    #[error("authentication required")]
    Unauthenticated,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Whether this error stems from the presented token rather than from
    /// configuration or infrastructure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AuthError::Rejected(_))
    }

    /// The rejection reason, if this is a rejection.
    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            AuthError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Configuration(_) => "configuration_error",
            AuthError::Rejected(reason) => reason.code(),
            AuthError::RemoteFetch(_) => "remote_fetch_error",
            AuthError::Encoding(_) => "encoding_error",
            AuthError::Unauthenticated => "unauthenticated",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Rejected(_) | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Configuration(_) | AuthError::RemoteFetch(_) | AuthError::Encoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn rejection_returns_401_with_reason_code() {
        let response = AuthError::Rejected(RejectReason::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "expired");
        assert_eq!(body["error"], "token has expired");
    }

    #[tokio::test]
    async fn configuration_error_returns_500() {
        let response = AuthError::Configuration("no key".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn only_rejections_are_rejections() {
        assert!(AuthError::from(RejectReason::BadSignature).is_rejection());
        assert!(!AuthError::RemoteFetch("down".into()).is_rejection());
        assert!(!AuthError::Configuration("none".into()).is_rejection());
        assert_eq!(AuthError::Unauthenticated.reason(), None);
    }

    #[test]
    fn codec_errors_map_to_reasons() {
        let missing = jsonwebtoken::errors::Error::from(ErrorKind::MissingRequiredClaim(
            "aud".to_string(),
        ));
        assert_eq!(
            RejectReason::from(&missing),
            RejectReason::MissingClaim("aud".into())
        );
        assert_eq!(RejectReason::from(&missing).code(), "missing_required_claim");

        let sig = jsonwebtoken::errors::Error::from(ErrorKind::InvalidSignature);
        assert_eq!(RejectReason::from(&sig), RejectReason::BadSignature);

        let garbage = jsonwebtoken::errors::Error::from(ErrorKind::InvalidToken);
        assert_eq!(RejectReason::from(&garbage).code(), "invalid_token");
    }
}
