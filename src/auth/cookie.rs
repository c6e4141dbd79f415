// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session cookie lookup and `Set-Cookie` directives.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use cookie::Cookie;
use time::OffsetDateTime;

use super::error::AuthError;

/// Find the value of cookie `name` across all `Cookie` headers.
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// Session cookie carrying `value`, without an explicit expiry.
pub fn session_cookie(name: &str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .path("/")
        .secure(secure)
        .build()
}

/// Cookie that makes clients delete `name`: empty value, expired at the epoch.
pub fn expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), String::new()))
        .path("/")
        .secure(secure)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Append `cookie` as a `Set-Cookie` header.
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) -> Result<(), AuthError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AuthError::Encoding(format!("invalid cookie header: {e}")))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}
