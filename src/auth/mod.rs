// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! JWT authentication for axum services.
//!
//! ## Auth Flow
//!
//! 1. A request arrives with `Authorization: <scheme> <JWT>` or a `jwt` cookie
//! 2. The middleware resolves a verification key:
//!    - the static shared secret, when configured
//!    - otherwise the JWKS entry named by the token's `kid` and `alg`
//! 3. Signature, `exp`, `nbf`, `aud` and `iss` are checked
//! 4. The outcome is attached as a [`Verification`] request extension
//! 5. Handlers may return an [`Issuance`] to set or clear the session cookie
//!
//! ## Failure Policy
//!
//! - A rejected header token goes to the unauthorized handler, or fails the request
//! - A rejected cookie is ignored; the request continues unauthenticated
//! - Missing key material and JWKS fetch failures always fail the request

pub mod claims;
pub mod cookie;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod keys;
pub mod middleware;
pub mod token;

pub use claims::{ClaimSet, Issuance, Verification};
pub use error::{AuthError, RejectReason};
pub use extractor::{Claims, OptionalClaims};
pub use jwks::JwksManager;
pub use keys::KeyResolver;
pub use middleware::{jwt_middleware, protect, JwtAuth, UnauthorizedHandler};
