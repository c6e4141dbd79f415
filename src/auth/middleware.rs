// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! [`JwtAuth`] inspects every request for a token, first in the configured
//! header and then in the session cookie, and attaches a [`Verification`]
//! to the request extensions. On the way out it honours an [`Issuance`]
//! left in the response extensions by a handler.
//!
//! ```rust,ignore
//! let auth = Arc::new(JwtAuth::new(JwtConfig::with_secret("secret"))?);
//!
//! let app = protect(
//!     Router::new().route("/me", get(me)),
//!     auth,
//! );
//! ```
//!
//! Header and cookie failures are handled differently. A rejected header
//! token goes to the custom unauthorized handler if one is set, otherwise it
//! fails the request. A rejected cookie is ignored and the request proceeds
//! unauthenticated.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Router,
};
use tracing::{debug, warn};

use super::claims::{ClaimSet, Issuance, Verification};
use super::cookie::{append_set_cookie, expired_cookie, find_cookie, session_cookie};
use super::error::{AuthError, RejectReason};
use super::keys::KeyResolver;
use super::token::{sign_claims, verify_token, ClaimRules};
use crate::config::JwtConfig;

/// Builds the response for a request whose header credential was rejected.
pub trait UnauthorizedHandler: Send + Sync {
    fn handle(&self, request: &Request) -> Response;
}

impl<F> UnauthorizedHandler for F
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    fn handle(&self, request: &Request) -> Response {
        self(request)
    }
}

/// JWT request/response interceptor.
pub struct JwtAuth {
    config: JwtConfig,
    rules: ClaimRules,
    keys: KeyResolver,
    unauthorized: Option<Arc<dyn UnauthorizedHandler>>,
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth")
            .field("config", &self.config)
            .field("unauthorized", &self.unauthorized.is_some())
            .finish()
    }
}

impl JwtAuth {
    /// Create the interceptor.
    ///
    /// # Errors
    /// Fails with [`AuthError::Configuration`] when the JWKS URL is unusable.
    pub fn new(config: JwtConfig) -> Result<Self, AuthError> {
        let keys = KeyResolver::new(&config)?;
        let rules = ClaimRules {
            audience: config.audience.clone(),
            issuer: config.issuer.clone(),
            leeway: config.leeway,
        };

        Ok(Self {
            config,
            rules,
            keys,
            unauthorized: None,
        })
    }

    /// Respond with `handler` instead of failing when a header token is rejected.
    pub fn with_unauthorized_handler(mut self, handler: impl UnauthorizedHandler + 'static) -> Self {
        self.unauthorized = Some(Arc::new(handler));
        self
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn key_resolver(&self) -> &KeyResolver {
        &self.keys
    }

    /// Verify `token` and return its claims.
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let (algorithms, key) = self.keys.resolve(token).await?;
        verify_token(token, &key, &algorithms, &self.rules)
    }

    /// Verify `token`, folding rejections into [`Verification::Rejected`].
    ///
    /// Configuration and key-fetch failures are still returned as errors.
    pub async fn check(&self, token: &str) -> Result<Verification, AuthError> {
        match self.verify(token).await {
            Ok(claims) => Ok(Verification::Verified(claims)),
            Err(AuthError::Rejected(reason)) => Ok(Verification::Rejected(reason)),
            Err(e) => Err(e),
        }
    }

    /// Sign `claims` with the static key and the first configured algorithm.
    pub fn issue(&self, claims: &ClaimSet) -> Result<String, AuthError> {
        let algorithm = self.config.signing_algorithm()?;
        sign_claims(claims, algorithm, self.keys.signing_secret()?)
    }

    /// Request phase.
    ///
    /// Returns `Ok(Some(response))` when the request must be answered
    /// immediately by the unauthorized handler.
    pub async fn on_request(&self, request: &mut Request) -> Result<Option<Response>, AuthError> {
        request.extensions_mut().insert(Verification::Absent);

        let header = request
            .headers()
            .get(self.config.header_name.as_str())
            .filter(|value| !value.is_empty());
        if let Some(header) = header {
            debug!(header = %self.config.header_name, "Verifying header credential");

            let outcome = match header.to_str() {
                Ok(value) => match value.split_once(' ') {
                    Some((_scheme, token)) => self.check(token).await?,
                    None => Verification::Rejected(RejectReason::invalid(
                        "malformed authorization header",
                    )),
                },
                Err(_) => Verification::Rejected(RejectReason::invalid(
                    "authorization header is not valid ASCII",
                )),
            };

            return match outcome {
                Verification::Rejected(reason) => {
                    warn!(reason = reason.code(), "Header credential rejected");
                    match &self.unauthorized {
                        Some(handler) => Ok(Some(handler.handle(request))),
                        None => Err(AuthError::Rejected(reason)),
                    }
                }
                verified => {
                    request.extensions_mut().insert(verified);
                    Ok(None)
                }
            };
        }

        if let Some(token) = find_cookie(request.headers(), &self.config.cookie_name) {
            debug!(cookie = %self.config.cookie_name, "Verifying cookie credential");

            match self.check(&token).await? {
                Verification::Rejected(reason) => {
                    warn!(reason = reason.code(), "Ignoring invalid session cookie");
                }
                verified => {
                    request.extensions_mut().insert(verified);
                }
            }
        }

        Ok(None)
    }

    /// Response phase: apply the handler's [`Issuance`], if any.
    pub fn on_response(&self, mut response: Response) -> Result<Response, AuthError> {
        let Some(issuance) = response.extensions_mut().remove::<Issuance>() else {
            return Ok(response);
        };

        let cookie = match issuance {
            Issuance::Encode(claims) => {
                let token = self.issue(&claims)?;
                session_cookie(&self.config.cookie_name, token, self.config.cookie_secure)
            }
            Issuance::Clear => expired_cookie(&self.config.cookie_name, self.config.cookie_secure),
        };

        append_set_cookie(response.headers_mut(), &cookie)?;
        Ok(response)
    }
}

/// Authentication middleware function.
///
/// Install with `axum::middleware::from_fn_with_state(auth, jwt_middleware)`
/// or through [`protect`].
pub async fn jwt_middleware(
    State(auth): State<Arc<JwtAuth>>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.on_request(&mut request).await {
        Ok(Some(response)) => return response,
        Ok(None) => {}
        Err(e) => {
            if !e.is_rejection() {
                warn!(error = %e, "Request authentication failed");
            }
            return e.into_response();
        }
    }

    let response = next.run(request).await;

    auth.on_response(response).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to issue session cookie");
        e.into_response()
    })
}

/// Wrap every route of `router` with [`jwt_middleware`].
pub fn protect<S>(router: Router<S>, auth: Arc<JwtAuth>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(auth, jwt_middleware))
}
