// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::auth::{ClaimSet, Claims, Issuance};

/// Return the caller's verified claims.
pub async fn me(Claims(claims): Claims) -> Json<ClaimSet> {
    Json(claims)
}

/// Start a session: the posted claims become the signed session cookie.
pub async fn create_session(Json(claims): Json<ClaimSet>) -> impl IntoResponse {
    (StatusCode::CREATED, Issuance::Encode(claims.clone()), Json(claims))
}

/// End the session by clearing the cookie.
pub async fn delete_session() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, Issuance::Clear, ())
}
