// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate: token verification plus permission lookup.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{Action, AuthError, AuthenticatedUser, AuthzError, PermissionTable, TokenIssuer};

/// Single decision point for "may this caller do this".
#[derive(Clone)]
pub struct AuthorizationGate {
    tokens: Arc<TokenIssuer>,
    permissions: Arc<PermissionTable>,
}

impl AuthorizationGate {
    pub fn new(tokens: Arc<TokenIssuer>, permissions: Arc<PermissionTable>) -> Self {
        Self {
            tokens,
            permissions,
        }
    }

    /// Resolve a bearer token into the caller's identity.
    pub fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<AuthenticatedUser, AuthError> {
        self.tokens.verify(token, now).inspect_err(|e| {
            tracing::debug!(reason = %e, "token rejected");
        })
    }

    /// Check `action` against the role's grants.
    pub fn authorize(&self, role: &str, action: Action) -> Result<(), AuthzError> {
        self.permissions.authorize(role, action).inspect_err(|e| {
            tracing::warn!(role, action = %action, reason = %e, "authorization refused");
        })
    }

    /// Authenticate and authorize in one step.
    pub fn admit(
        &self,
        token: &str,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedUser, AuthError> {
        let user = self.authenticate(token, now)?;
        self.authorize(user.role.as_str(), action)?;
        Ok(user)
    }
}
