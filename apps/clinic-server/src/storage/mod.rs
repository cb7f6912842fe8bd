// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage for staff accounts and patient records in a single
//! embedded redb file (default `data/clinic.redb`).
//!
//! ## Layout
//!
//! - [`database`]: table definitions, error type, id sequences
//! - [`repository`]: one repository per entity behind a store trait
//!
//! Records are stored as JSON bytes keyed by numeric id. Secondary tables
//! index the unique columns (account username, patient email).

pub mod database;
pub mod repository;

pub use database::{ClinicDatabase, StorageError, StorageResult};
pub use repository::{
    AccountChanges, AccountRepository, AccountStore, NewAccount, NewPatient, PatientChanges,
    PatientRepository, PatientStore, StoredAccount, StoredPatient,
};
