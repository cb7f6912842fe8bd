// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Patient record service.
//!
//! Every operation asks the [`AuthorizationGate`] first. Only a permitted
//! caller gets its id parsed and its request sent to the store, so a refused
//! or malformed request leaves the database untouched.

use std::sync::Arc;

use chrono::NaiveDate;

use super::{parse_id, required, ServiceError, ServiceResult};
use crate::auth::{Action, AuthorizationGate, Role};
use crate::models::{CreatePatientRequest, PatientResponse, UpdatePatientRequest};
use crate::storage::{NewPatient, PatientChanges, PatientStore};

const DOB_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn PatientStore>,
    gate: AuthorizationGate,
}

impl PatientService {
    pub fn new(store: Arc<dyn PatientStore>, gate: AuthorizationGate) -> Self {
        Self { store, gate }
    }

    pub fn create(&self, request: CreatePatientRequest, role: Role) -> ServiceResult<PatientResponse> {
        self.gate.authorize(role.as_str(), Action::CreatePatient)?;

        let patient = NewPatient {
            first_name: required("first_name", &request.first_name)?,
            last_name: required("last_name", &request.last_name)?,
            dob: parse_dob(&request.dob)?,
            email: request.email.as_deref().map(parse_email).transpose()?.flatten(),
            gender: required("gender", &request.gender)?,
            phone_number: required("phone_number", &request.phone_number)?,
            address: required("address", &request.address)?,
            medical_history: required("medical_history", &request.medical_history)?,
        };

        let stored = self.store.create(patient)?;
        tracing::info!(patient_id = stored.id, role = %role, "patient created");
        Ok(stored.into())
    }

    pub fn get_by_id(&self, id: &str, role: Role) -> ServiceResult<PatientResponse> {
        self.gate.authorize(role.as_str(), Action::ViewPatient)?;
        let id = parse_id(id)?;
        Ok(self.store.get_by_id(id)?.into())
    }

    pub fn update_by_id(
        &self,
        id: &str,
        request: UpdatePatientRequest,
        role: Role,
    ) -> ServiceResult<PatientResponse> {
        self.gate.authorize(role.as_str(), Action::UpdatePatient)?;
        let id = parse_id(id)?;
        let changes = patch_to_changes(request)?;

        let stored = self.store.update_by_id(id, changes)?;
        tracing::info!(patient_id = id, role = %role, "patient updated");
        Ok(stored.into())
    }

    pub fn delete_by_id(&self, id: &str, role: Role) -> ServiceResult<()> {
        self.gate.authorize(role.as_str(), Action::DeletePatient)?;
        let id = parse_id(id)?;
        self.store.delete_by_id(id)?;
        tracing::info!(patient_id = id, role = %role, "patient deleted");
        Ok(())
    }
}

fn patch_to_changes(request: UpdatePatientRequest) -> ServiceResult<PatientChanges> {
    let optional = |field: &str, value: Option<String>| {
        value.map(|v| required(field, &v)).transpose()
    };

    Ok(PatientChanges {
        first_name: optional("first_name", request.first_name)?,
        last_name: optional("last_name", request.last_name)?,
        dob: request.dob.as_deref().map(parse_dob).transpose()?,
        email: request.email.as_deref().map(parse_email).transpose()?,
        gender: optional("gender", request.gender)?,
        phone_number: optional("phone_number", request.phone_number)?,
        address: optional("address", request.address)?,
        medical_history: optional("medical_history", request.medical_history)?,
    })
}

/// Strict `YYYY-MM-DD`.
fn parse_dob(raw: &str) -> ServiceResult<NaiveDate> {
    let invalid = || ServiceError::Validation("dob must be YYYY-MM-DD".to_string());
    let raw = raw.trim();
    let shaped = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, DOB_FORMAT).map_err(|_| invalid())
}

/// Empty means "no email"; anything else must look like an address.
fn parse_email(raw: &str) -> ServiceResult<Option<String>> {
    let email = raw.trim();
    if email.is_empty() {
        return Ok(None);
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ServiceError::Validation("email is not a valid address".to_string()));
    }
    Ok(Some(email.to_string()))
}
