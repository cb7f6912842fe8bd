// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require a valid session token:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::Utc;

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Legacy header carrying the raw token, still sent by older clients.
pub const LEGACY_TOKEN_HEADER: &str = "token";

/// Extractor for authenticated callers.
///
/// Reads `Authorization: Bearer <token>` (or the bare `token` header) and
/// verifies it through the [`AuthorizationGate`](super::AuthorizationGate).
/// Account routes use this; they have no role requirement.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = state.gate.authenticate(token, Utc::now())?;
        Ok(Auth(user))
    }
}

/// The presented session token, not yet verified.
///
/// Patient routes take this instead of [`Auth`] and hand it to
/// [`AuthorizationGate::admit`](super::AuthorizationGate::admit) together with
/// the route's action, before the request body is read.
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers).map(|token| BearerToken(token.to_string()))
    }
}

/// Pull the raw token out of the request headers.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?
            .trim();
        if token.is_empty() {
            return Err(AuthError::InvalidAuthHeader);
        }
        return Ok(token);
    }

    match headers.get(LEGACY_TOKEN_HEADER) {
        Some(value) => {
            let token = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?.trim();
            if token.is_empty() {
                Err(AuthError::MissingAuthHeader)
            } else {
                Ok(token)
            }
        }
        None => Err(AuthError::MissingAuthHeader),
    }
}
