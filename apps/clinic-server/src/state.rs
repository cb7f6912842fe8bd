// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthorizationGate, PasswordHasher, PermissionTable, TokenIssuer};
use crate::services::{AccountService, PatientService};
use crate::storage::{AccountRepository, ClinicDatabase, PatientRepository};

/// Shared application state handed to every handler.
///
/// Everything here is read-only after startup except the database, which
/// serializes writes through its own transactions.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<ClinicDatabase>,
    pub tokens: Arc<TokenIssuer>,
    pub gate: AuthorizationGate,
    pub accounts: AccountService,
    pub patients: PatientService,
}

impl AppState {
    pub fn new(db: Arc<ClinicDatabase>, jwt_secret: &[u8]) -> Self {
        let tokens = Arc::new(TokenIssuer::new(jwt_secret));
        let gate = AuthorizationGate::new(tokens.clone(), Arc::new(PermissionTable::standard()));

        let accounts = AccountService::new(
            Arc::new(AccountRepository::new(db.clone())),
            PasswordHasher::new(),
            tokens.clone(),
        );
        let patients = PatientService::new(Arc::new(PatientRepository::new(db.clone())), gate.clone());

        Self {
            db,
            tokens,
            gate,
            accounts,
            patients,
        }
    }
}
