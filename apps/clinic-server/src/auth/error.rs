// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use super::permissions::AuthzError;

/// Authentication error type.
///
/// Every token failure maps to 401; the variants are kept apart so logs can
/// say *why* a token was refused. Clients only ever see the generic message.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token header present
    #[error("authorization header is required")]
    MissingAuthHeader,
    /// Header present but not `Bearer <token>`
    #[error("invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token is not a well-formed JWT or carries unusable claims
    #[error("token is malformed")]
    MalformedToken,
    /// Signature does not match the server secret
    #[error("token signature is invalid")]
    InvalidSignature,
    /// `exp` is at or before the check time
    #[error("token has expired")]
    TokenExpired,
    /// `iss` is not this service
    #[error("token issuer is invalid")]
    InvalidIssuer,
    /// Signing a fresh token failed
    #[error("failed to sign token: {0}")]
    SigningFailed(String),
    /// Token is fine but the role may not perform the action
    #[error(transparent)]
    Forbidden(#[from] AuthzError),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::SigningFailed(_) => "internal_error",
            AuthError::Forbidden(AuthzError::UnknownRole(_)) => "unknown_role",
            AuthError::Forbidden(AuthzError::PermissionDenied { .. }) => "permission_denied",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidIssuer => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::SigningFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    pub fn public_message(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => match self {
                AuthError::MissingAuthHeader => "Authorization header is missing",
                _ => "Invalid token",
            },
            StatusCode::FORBIDDEN => "You do not have permission to perform this action",
            _ => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.public_message().to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
