// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role → action permission table.
//!
//! The grants live in [`STANDARD_GRANTS`] as plain data. Adding a role or an
//! action means adding a row, never a new `match` arm.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// An operation on patient records that requires a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreatePatient,
    ViewPatient,
    UpdatePatient,
    DeletePatient,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreatePatient => "create_patient",
            Action::ViewPatient => "view_patient",
            Action::UpdatePatient => "update_patient",
            Action::DeletePatient => "delete_patient",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grants loaded into the table at startup.
pub const STANDARD_GRANTS: &[(&str, &[Action])] = &[
    ("doctor", &[Action::ViewPatient, Action::UpdatePatient]),
    (
        "receptionist",
        &[
            Action::CreatePatient,
            Action::DeletePatient,
            Action::UpdatePatient,
            Action::ViewPatient,
        ],
    ),
];

/// Authorization failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("role '{role}' lacks permission '{action}'")]
    PermissionDenied { role: String, action: Action },
}

/// Immutable role → action-set mapping.
#[derive(Debug, Clone)]
pub struct PermissionTable {
    grants: HashMap<String, HashSet<Action>>,
}

impl PermissionTable {
    /// Build a table from `(role, actions)` rows.
    pub fn from_grants(rows: &[(&str, &[Action])]) -> Self {
        let mut grants: HashMap<String, HashSet<Action>> = HashMap::new();
        for (role, actions) in rows {
            grants
                .entry((*role).to_string())
                .or_default()
                .extend(actions.iter().copied());
        }
        Self { grants }
    }

    /// The clinic's standard table.
    pub fn standard() -> Self {
        Self::from_grants(STANDARD_GRANTS)
    }

    /// Admit or reject `action` for `role`.
    pub fn authorize(&self, role: &str, action: Action) -> Result<(), AuthzError> {
        let granted = self
            .grants
            .get(role)
            .ok_or_else(|| AuthzError::UnknownRole(role.to_string()))?;

        if granted.contains(&action) {
            Ok(())
        } else {
            Err(AuthzError::PermissionDenied {
                role: role.to_string(),
                action,
            })
        }
    }
}
