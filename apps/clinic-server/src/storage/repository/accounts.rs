// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account repository.
//!
//! Accounts are keyed by a numeric id from the `accounts` sequence. The
//! `account_usernames` index enforces username uniqueness.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::storage::database::{next_id, ACCOUNTS, ACCOUNT_USERNAMES};
use crate::storage::{ClinicDatabase, StorageError, StorageResult};

/// Account row as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAccount {
    pub id: u64,
    /// Unique, immutable after creation
    pub username: String,
    /// Argon2 PHC string; never leaves the service layer
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account to insert; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Sparse account update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub password_hash: Option<String>,
}

impl AccountChanges {
    pub fn is_empty(&self) -> bool {
        self.password_hash.is_none()
    }
}

/// Persistence contract for accounts.
pub trait AccountStore: Send + Sync {
    /// Insert; `AlreadyExists` if the username is taken.
    fn create(&self, account: NewAccount) -> StorageResult<StoredAccount>;
    fn get_by_id(&self, id: u64) -> StorageResult<StoredAccount>;
    fn get_by_username(&self, username: &str) -> StorageResult<StoredAccount>;
    fn exists_by_username(&self, username: &str) -> StorageResult<bool>;
    fn update_by_id(&self, id: u64, changes: AccountChanges) -> StorageResult<StoredAccount>;
    fn delete_by_id(&self, id: u64) -> StorageResult<()>;
}

/// redb-backed [`AccountStore`].
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: Arc<ClinicDatabase>,
}

impl AccountRepository {
    pub fn new(db: Arc<ClinicDatabase>) -> Self {
        Self { db }
    }
}

impl AccountStore for AccountRepository {
    fn create(&self, account: NewAccount) -> StorageResult<StoredAccount> {
        let write_txn = self.db.db().begin_write()?;
        let stored = {
            let mut usernames = write_txn.open_table(ACCOUNT_USERNAMES)?;
            if usernames.get(account.username.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Account {}",
                    account.username
                )));
            }

            let id = next_id(&write_txn, "accounts")?;
            let now = Utc::now();
            let stored = StoredAccount {
                id,
                username: account.username,
                password_hash: account.password_hash,
                role: account.role,
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&stored)?;
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            accounts.insert(id, json.as_slice())?;
            usernames.insert(stored.username.as_str(), id)?;
            stored
        };
        write_txn.commit()?;
        Ok(stored)
    }

    fn get_by_id(&self, id: u64) -> StorageResult<StoredAccount> {
        let read_txn = self.db.db().begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;
        let account = match table.get(id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::NotFound(format!("Account {id}"))),
        };
        Ok(account)
    }

    fn get_by_username(&self, username: &str) -> StorageResult<StoredAccount> {
        let read_txn = self.db.db().begin_read()?;
        let usernames = read_txn.open_table(ACCOUNT_USERNAMES)?;
        let id = usernames
            .get(username)?
            .map(|v| v.value())
            .ok_or_else(|| StorageError::NotFound(format!("Account {username}")))?;

        let accounts = read_txn.open_table(ACCOUNTS)?;
        let account = match accounts.get(id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::NotFound(format!("Account {id}"))),
        };
        Ok(account)
    }

    fn exists_by_username(&self, username: &str) -> StorageResult<bool> {
        let read_txn = self.db.db().begin_read()?;
        let usernames = read_txn.open_table(ACCOUNT_USERNAMES)?;
        let exists = usernames.get(username)?.is_some();
        Ok(exists)
    }

    fn update_by_id(&self, id: u64, changes: AccountChanges) -> StorageResult<StoredAccount> {
        let write_txn = self.db.db().begin_write()?;
        let account = {
            let mut table = write_txn.open_table(ACCOUNTS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = table
                    .get(id)?
                    .ok_or_else(|| StorageError::NotFound(format!("Account {id}")))?;
                existing.value().to_vec()
            };

            let mut account: StoredAccount = serde_json::from_slice(&existing_bytes)?;
            if changes.is_empty() {
                account
            } else {
                if let Some(password_hash) = changes.password_hash {
                    account.password_hash = password_hash;
                }
                account.updated_at = Utc::now();

                let json = serde_json::to_vec(&account)?;
                table.insert(id, json.as_slice())?;
                account
            }
        };
        write_txn.commit()?;
        Ok(account)
    }

    fn delete_by_id(&self, id: u64) -> StorageResult<()> {
        let write_txn = self.db.db().begin_write()?;
        {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let removed_bytes = {
                let removed = accounts
                    .remove(id)?
                    .ok_or_else(|| StorageError::NotFound(format!("Account {id}")))?;
                removed.value().to_vec()
            };
            let account: StoredAccount = serde_json::from_slice(&removed_bytes)?;

            let mut usernames = write_txn.open_table(ACCOUNT_USERNAMES)?;
            usernames.remove(account.username.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
