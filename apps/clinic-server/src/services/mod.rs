// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Service Layer
//!
//! Business rules between the HTTP handlers and the repositories:
//!
//! - [`AccountService`]: signup, login, self-service password change, deletion
//! - [`PatientService`]: patient CRUD, each call authorized against the
//!   caller's role before any store access
//!
//! Services return [`ServiceError`]; the HTTP layer maps each variant to a
//! status code.

pub mod accounts;
pub mod patients;

pub use accounts::{AccountPatch, AccountService, LoginOutcome};
pub use patients::PatientService;

use thiserror::Error;

use crate::auth::{AuthzError, HashingError};
use crate::storage::StorageError;

/// Domain errors shared by all services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Request data failed validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Path id is not a positive integer
    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Unknown username or wrong password; deliberately indistinguishable
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    /// Caller tried to change an account other than their own
    #[error("caller does not own this account")]
    NotOwner,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => ServiceError::NotFound(what),
            StorageError::AlreadyExists(what) => ServiceError::Conflict(what),
            other => {
                tracing::error!(error = %other, "storage failure");
                ServiceError::Internal(other.to_string())
            }
        }
    }
}

impl From<HashingError> for ServiceError {
    fn from(e: HashingError) -> Self {
        tracing::error!(error = %e, "password hashing failure");
        ServiceError::Internal(e.to_string())
    }
}

/// Parse a path id. Zero, signs and non-digits are rejected.
pub fn parse_id(raw: &str) -> ServiceResult<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::InvalidId(raw.to_string()));
    }
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ServiceError::InvalidId(raw.to_string())),
    }
}

/// Trim `value` and reject it when nothing is left.
pub(crate) fn required(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Action;

    #[test]
    fn parse_id_accepts_positive_integers() {
        assert_eq!(parse_id("1").unwrap(), 1);
        assert_eq!(parse_id("42").unwrap(), 42);
    }

    #[test]
    fn parse_id_rejects_everything_else() {
        for raw in ["", "abc", "0", "-1", "+1", "1.5", " 1", "99999999999999999999999"] {
            assert!(
                matches!(parse_id(raw), Err(ServiceError::InvalidId(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn storage_errors_map_by_variant() {
        assert!(matches!(
            ServiceError::from(StorageError::NotFound("Patient 1".into())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(StorageError::AlreadyExists("Account bob".into())),
            ServiceError::Conflict(_)
        ));
        let io = std::io::Error::other("disk gone");
        assert!(matches!(
            ServiceError::from(StorageError::Io(io)),
            ServiceError::Internal(_)
        ));
    }

    #[test]
    fn authz_errors_become_forbidden() {
        let err: ServiceError = AuthzError::PermissionDenied {
            role: "doctor".into(),
            action: Action::CreatePatient,
        }
        .into();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", "  Ann ").unwrap(), "Ann");
        assert!(matches!(
            required("name", "   "),
            Err(ServiceError::Validation(_))
        ));
    }
}
