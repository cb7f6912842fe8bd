// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuthError, Role};

/// Claims carried inside a session token.
///
/// Only `sub`, `role` and `exp` drive decisions. `iat`, `iss` and `jti` are
/// there for validation and log correlation; none of them is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the account id, as a decimal string
    pub sub: String,
    /// Role at the time of login
    pub role: Role,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
    /// Issuer, always this service
    pub iss: String,
    /// Random token id
    pub jti: String,
}

/// Identity reconstructed from a verified token.
///
/// This is the primary type used throughout the application to represent
/// the caller making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Account id (token `sub`)
    pub account_id: u64,
    /// Caller's role
    pub role: Role,
    /// When the presented token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Token id, for log correlation
    #[serde(skip)]
    pub token_id: String,
}

impl AuthenticatedUser {
    /// Build from decoded claims.
    ///
    /// A `sub` that is not an account id or an out-of-range `exp` makes the
    /// token malformed.
    pub fn from_claims(claims: TokenClaims) -> Result<Self, AuthError> {
        let account_id = claims
            .sub
            .parse::<u64>()
            .map_err(|_| AuthError::MalformedToken)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::MalformedToken)?;

        Ok(Self {
            account_id,
            role: claims.role,
            expires_at,
            token_id: claims.jti,
        })
    }

    /// Whether this caller is the owner of account `account_id`.
    pub fn owns_account(&self, account_id: u64) -> bool {
        self.account_id == account_id
    }
}
