// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Staff roles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Staff role assigned at signup.
///
/// The role is fixed for the lifetime of an account and travels in every
/// session token. What a role may do is decided by the
/// [`PermissionTable`](super::PermissionTable), not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Clinician; may view and update patient records
    Doctor,
    /// Front desk; manages the patient register
    Receptionist,
}

impl Role {
    /// Parse a role name exactly as it appears on the wire.
    ///
    /// Matching is exact: no case folding, no surrounding whitespace.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "doctor" => Some(Role::Doctor),
            "receptionist" => Some(Role::Receptionist),
            _ => None,
        }
    }

    /// Wire name of the role, also the key in the permission table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
