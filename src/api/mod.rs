// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{auth::protect, state::AppState};

pub mod health;
pub mod session;

pub fn router(state: AppState) -> Router {
    let auth = state.auth.clone();

    let v1_routes = Router::new()
        .route("/me", get(session::me))
        .route(
            "/session",
            post(session::create_session).delete(session::delete_session),
        );

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/v1", protect(v1_routes, auth))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtAuth;
    use crate::config::JwtConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(
            JwtAuth::new(JwtConfig::with_secret("secret")).unwrap(),
        ))
    }

    #[tokio::test]
    async fn health_needs_no_credentials() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn me_requires_authentication() {
        let response = app()
            .oneshot(Request::builder().uri("/v1/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_cookie_authenticates_me() {
        let login = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/session")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Kyle"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(login.status(), StatusCode::CREATED);

        let set_cookie = login.headers()[header::SET_COOKIE].to_str().unwrap();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let me = app()
            .oneshot(
                Request::builder()
                    .uri("/v1/me")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(me.status(), StatusCode::OK);

        let body = to_bytes(me.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({"name": "Kyle"}));
    }

    #[tokio::test]
    async fn delete_session_clears_cookie() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("jwt=;"));
        assert!(set_cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }
}
