// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Every type derives
//! `ToSchema` so it shows up in the OpenAPI document.
//!
//! Responses wrap their payload in a named envelope (`{"user": ...}`,
//! `{"patient": ...}`), which is what existing clients expect.
//!
//! ## Model Categories
//!
//! - **Accounts**: signup, login, password change, public account view
//! - **Patients**: create/update requests and the patient record view

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::{StoredAccount, StoredPatient};

// =============================================================================
// Account Models
// =============================================================================

/// Request body for `POST /api/user/signup`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    /// `doctor` or `receptionist`
    #[schema(example = "receptionist")]
    pub role: String,
}

/// Request body for `POST /api/user/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `PUT /api/user/{id}`.
///
/// Username and role cannot be changed after signup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    /// New password; omitted leaves the password unchanged
    #[serde(default)]
    pub password: Option<String>,
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccountResponse {
    pub id: u64,
    pub username: String,
    pub role: Role,
}

impl From<StoredAccount> for AccountResponse {
    fn from(account: StoredAccount) -> Self {
        Self {
            id: account.id,
            username: account.username,
            role: account.role,
        }
    }
}

/// `{"user": ...}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountEnvelope {
    pub user: AccountResponse,
}

/// Response body for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: AccountResponse,
    /// Bearer token for the `Authorization` header
    pub token: String,
    /// When the token stops being accepted (24 hours after login)
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Patient Models
// =============================================================================

/// Request body for `POST /api/patient`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    /// Date of birth, `YYYY-MM-DD`
    #[schema(example = "1985-07-10")]
    pub dob: String,
    /// Optional; an empty string means no email
    #[serde(default)]
    pub email: Option<String>,
    pub gender: String,
    pub phone_number: String,
    pub address: String,
    pub medical_history: String,
}

/// Request body for `PUT /api/patient/{id}`. Omitted fields are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `YYYY-MM-DD`
    pub dob: Option<String>,
    /// An empty string clears the email
    pub email: Option<String>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
}

/// Patient record as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PatientResponse {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub gender: String,
    pub phone_number: String,
    pub address: String,
    pub medical_history: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredPatient> for PatientResponse {
    fn from(p: StoredPatient) -> Self {
        Self {
            id: p.id,
            first_name: p.first_name,
            last_name: p.last_name,
            dob: p.dob,
            email: p.email,
            gender: p.gender,
            phone_number: p.phone_number,
            address: p.address,
            medical_history: p.medical_history,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// `{"patient": ...}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientEnvelope {
    pub patient: PatientResponse,
}

/// `{"message": ...}` body for deletions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
