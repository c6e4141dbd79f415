// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT Cookie Auth - request/response authentication layer for axum
//!
//! Verifies signed tokens carried in a header or a session cookie, against a
//! static shared secret or a remotely published key set, and issues signed
//! session cookies on the way out.
//!
//! ## Modules
//!
//! - `auth` - Token verification, key resolution and the middleware
//! - `config` - Configuration surface and environment loading
//! - `api` - Demo HTTP routes
//! - `state` - Demo application state

pub mod api;
pub mod auth;
pub mod config;
pub mod state;

pub use auth::{AuthError, ClaimSet, Issuance, JwtAuth, Verification};
pub use config::JwtConfig;
