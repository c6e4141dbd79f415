// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness response with individual component status.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// JWKS status; absent when a static key is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<String>,
}

/// Check if JWKS is available (remote key resolution only).
async fn check_jwks(state: &AppState) -> Option<String> {
    let jwks_manager = state.auth.key_resolver().jwks()?;
    if jwks_manager.is_cached().await {
        return Some("ok".to_string());
    }
    match jwks_manager.refresh().await {
        Ok(()) => Some("ok".to_string()),
        Err(_) => Some("unavailable".to_string()),
    }
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe.
///
/// Returns 200 if all checks pass, 503 if any check fails.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let jwks = check_jwks(&state).await;
    let healthy = jwks.as_deref().is_none_or(|s| s == "ok");

    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(ReadyResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            jwks,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtAuth;
    use crate::config::JwtConfig;

    #[tokio::test]
    async fn ready_without_jwks_is_ok() {
        let state = AppState::new(JwtAuth::new(JwtConfig::with_secret("secret")).unwrap());
        let (status, Json(body)) = ready(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.jwks.is_none());
    }

    #[tokio::test]
    async fn ready_reports_unreachable_jwks() {
        let server = wiremock::MockServer::start().await;
        let state = AppState::new(
            JwtAuth::new(JwtConfig::with_jwks(format!("{}/jwks", server.uri()))).unwrap(),
        );
        let (status, Json(body)) = ready(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.jwks.as_deref(), Some("unavailable"));
    }
}
