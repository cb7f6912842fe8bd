// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the clinic database.
//!
//! Each repository implements a store trait so services can be exercised
//! against in-memory doubles.

pub mod accounts;
pub mod patients;

pub use accounts::{AccountChanges, AccountRepository, AccountStore, NewAccount, StoredAccount};
pub use patients::{NewPatient, PatientChanges, PatientRepository, PatientStore, StoredPatient};
