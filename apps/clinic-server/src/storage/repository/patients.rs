// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Patient repository.
//!
//! Patients are keyed by a numeric id from the `patients` sequence. Email is
//! optional, but no two patients may share one (compared case-insensitively).

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use redb::{ReadableDatabase, ReadableTable, Table};
use serde::{Deserialize, Serialize};

use crate::storage::database::{next_id, PATIENTS, PATIENT_EMAILS};
use crate::storage::{ClinicDatabase, StorageError, StorageResult};

/// Patient row as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredPatient {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Option<String>,
    pub gender: String,
    pub phone_number: String,
    pub address: String,
    pub medical_history: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Patient to insert; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Option<String>,
    pub gender: String,
    pub phone_number: String,
    pub address: String,
    pub medical_history: String,
}

/// Sparse patient update. `None` leaves the field untouched;
/// `email: Some(None)` clears the email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub email: Option<Option<String>>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
}

impl PatientChanges {
    pub fn is_empty(&self) -> bool {
        *self == PatientChanges::default()
    }

    /// Apply the present fields to `patient`.
    fn apply(self, patient: &mut StoredPatient) {
        if let Some(v) = self.first_name {
            patient.first_name = v;
        }
        if let Some(v) = self.last_name {
            patient.last_name = v;
        }
        if let Some(v) = self.dob {
            patient.dob = v;
        }
        if let Some(v) = self.email {
            patient.email = v;
        }
        if let Some(v) = self.gender {
            patient.gender = v;
        }
        if let Some(v) = self.phone_number {
            patient.phone_number = v;
        }
        if let Some(v) = self.address {
            patient.address = v;
        }
        if let Some(v) = self.medical_history {
            patient.medical_history = v;
        }
    }
}

/// Persistence contract for patients.
pub trait PatientStore: Send + Sync {
    /// Insert; `AlreadyExists` if the email belongs to another patient.
    fn create(&self, patient: NewPatient) -> StorageResult<StoredPatient>;
    fn get_by_id(&self, id: u64) -> StorageResult<StoredPatient>;
    fn update_by_id(&self, id: u64, changes: PatientChanges) -> StorageResult<StoredPatient>;
    fn delete_by_id(&self, id: u64) -> StorageResult<()>;
}

fn email_key(email: &str) -> String {
    email.to_lowercase()
}

/// Point `email` at `id`, failing if another patient holds it.
fn claim_email(index: &mut Table<'_, &'static str, u64>, email: &str, id: u64) -> StorageResult<()> {
    let key = email_key(email);
    let holder = index.get(key.as_str())?.map(|v| v.value());
    match holder {
        Some(other) if other != id => Err(StorageError::AlreadyExists(format!(
            "Patient email {email}"
        ))),
        _ => {
            index.insert(key.as_str(), id)?;
            Ok(())
        }
    }
}

/// redb-backed [`PatientStore`].
#[derive(Debug, Clone)]
pub struct PatientRepository {
    db: Arc<ClinicDatabase>,
}

impl PatientRepository {
    pub fn new(db: Arc<ClinicDatabase>) -> Self {
        Self { db }
    }
}

impl PatientStore for PatientRepository {
    fn create(&self, patient: NewPatient) -> StorageResult<StoredPatient> {
        let write_txn = self.db.db().begin_write()?;
        let stored = {
            let id = next_id(&write_txn, "patients")?;

            if let Some(email) = &patient.email {
                let mut emails = write_txn.open_table(PATIENT_EMAILS)?;
                claim_email(&mut emails, email, id)?;
            }

            let now = Utc::now();
            let stored = StoredPatient {
                id,
                first_name: patient.first_name,
                last_name: patient.last_name,
                dob: patient.dob,
                email: patient.email,
                gender: patient.gender,
                phone_number: patient.phone_number,
                address: patient.address,
                medical_history: patient.medical_history,
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&stored)?;
            let mut patients = write_txn.open_table(PATIENTS)?;
            patients.insert(id, json.as_slice())?;
            stored
        };
        write_txn.commit()?;
        Ok(stored)
    }

    fn get_by_id(&self, id: u64) -> StorageResult<StoredPatient> {
        let read_txn = self.db.db().begin_read()?;
        let table = read_txn.open_table(PATIENTS)?;
        let patient = match table.get(id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::NotFound(format!("Patient {id}"))),
        };
        Ok(patient)
    }

    fn update_by_id(&self, id: u64, changes: PatientChanges) -> StorageResult<StoredPatient> {
        let write_txn = self.db.db().begin_write()?;
        let patient = {
            let mut table = write_txn.open_table(PATIENTS)?;

            let existing_bytes = {
                let existing = table
                    .get(id)?
                    .ok_or_else(|| StorageError::NotFound(format!("Patient {id}")))?;
                existing.value().to_vec()
            };
            let mut patient: StoredPatient = serde_json::from_slice(&existing_bytes)?;

            if changes.is_empty() {
                patient
            } else {
                if let Some(new_email) = &changes.email {
                    let mut emails = write_txn.open_table(PATIENT_EMAILS)?;
                    if let Some(new_email) = new_email {
                        claim_email(&mut emails, new_email, id)?;
                    }
                    if let Some(old_email) = &patient.email {
                        let unchanged = new_email
                            .as_deref()
                            .is_some_and(|e| email_key(e) == email_key(old_email));
                        if !unchanged {
                            emails.remove(email_key(old_email).as_str())?;
                        }
                    }
                }

                changes.apply(&mut patient);
                patient.updated_at = Utc::now();

                let json = serde_json::to_vec(&patient)?;
                table.insert(id, json.as_slice())?;
                patient
            }
        };
        write_txn.commit()?;
        Ok(patient)
    }

    fn delete_by_id(&self, id: u64) -> StorageResult<()> {
        let write_txn = self.db.db().begin_write()?;
        {
            let mut patients = write_txn.open_table(PATIENTS)?;
            let removed_bytes = {
                let removed = patients
                    .remove(id)?
                    .ok_or_else(|| StorageError::NotFound(format!("Patient {id}")))?;
                removed.value().to_vec()
            };
            let patient: StoredPatient = serde_json::from_slice(&removed_bytes)?;

            if let Some(email) = &patient.email {
                let mut emails = write_txn.open_table(PATIENT_EMAILS)?;
                emails.remove(email_key(email).as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}
