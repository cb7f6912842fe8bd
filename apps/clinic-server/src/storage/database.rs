// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded clinic database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `accounts`: account id → serialized StoredAccount
//! - `account_usernames`: username → account id (uniqueness index)
//! - `patients`: patient id → serialized StoredPatient
//! - `patient_emails`: lowercase email → patient id (uniqueness index)
//! - `sequences`: sequence name → last id handed out
//!
//! Every repository operation runs in a single redb transaction, so the
//! uniqueness check and the insert it guards commit or fail together.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: account id → serialized StoredAccount (JSON bytes).
pub(crate) const ACCOUNTS: TableDefinition<u64, &[u8]> = TableDefinition::new("accounts");

/// Index: username → account id.
pub(crate) const ACCOUNT_USERNAMES: TableDefinition<&str, u64> =
    TableDefinition::new("account_usernames");

/// Primary table: patient id → serialized StoredPatient (JSON bytes).
pub(crate) const PATIENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("patients");

/// Index: lowercase email → patient id.
pub(crate) const PATIENT_EMAILS: TableDefinition<&str, u64> =
    TableDefinition::new("patient_emails");

/// Id sequences: name → last assigned id.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// ClinicDatabase
// =============================================================================

/// Embedded ACID database holding accounts and patients.
pub struct ClinicDatabase {
    db: Database,
}

impl std::fmt::Debug for ClinicDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClinicDatabase").finish_non_exhaustive()
    }
}

impl ClinicDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(ACCOUNT_USERNAMES)?;
            let _ = write_txn.open_table(PATIENTS)?;
            let _ = write_txn.open_table(PATIENT_EMAILS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "clinic database opened");
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    /// Confirm the database answers a read transaction.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCES)?;
        let _ = table.get("accounts")?;
        Ok(())
    }
}

/// Hand out the next id of `sequence` inside an open write transaction.
///
/// Ids start at 1 and are never reused, even after deletes.
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> StorageResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let last = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = last + 1;
    table.insert(sequence, next)?;
    Ok(next)
}
