// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account service: signup, login and self-service account changes.
//!
//! Lifecycle of an account: created by signup, read by login and lookups,
//! password changed by its owner, deleted by its owner. Deletion is final.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{parse_id, required, ServiceError, ServiceResult};
use crate::auth::{AuthenticatedUser, IssuedToken, PasswordHasher, Role, TokenIssuer};
use crate::models::AccountResponse;
use crate::storage::{AccountChanges, AccountStore, NewAccount, StorageError};

/// Sparse account update. Only the password is mutable.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub password: Option<String>,
}

/// Successful login: the account plus a fresh session token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: AccountResponse,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenIssuer>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, hasher: PasswordHasher, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Register a new account.
    pub fn signup(&self, username: &str, password: &str, role: &str) -> ServiceResult<AccountResponse> {
        let username = required("username", username)?;
        if password.is_empty() {
            return Err(ServiceError::Validation("password is required".to_string()));
        }
        let role = Role::parse(role).ok_or_else(|| ServiceError::InvalidRole(role.to_string()))?;

        if self.store.exists_by_username(&username)? {
            return Err(ServiceError::Conflict(format!("Account {username}")));
        }

        let password_hash = self.hasher.hash(password)?;
        let account = self.store.create(NewAccount {
            username,
            password_hash,
            role,
        })?;

        tracing::info!(account_id = account.id, role = %account.role, "account created");
        Ok(account.into())
    }

    /// Check credentials and issue a token valid for 24 hours from `now`.
    ///
    /// An unknown username and a wrong password fail the same way.
    pub fn login(&self, username: &str, password: &str, now: DateTime<Utc>) -> ServiceResult<LoginOutcome> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "username and password are required".to_string(),
            ));
        }

        let account = match self.store.get_by_username(username.trim()) {
            Ok(account) => account,
            Err(StorageError::NotFound(_)) => {
                self.hasher.verify_dummy(password);
                tracing::info!("login failed: unknown username");
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.hasher.verify(password, &account.password_hash) {
            tracing::info!(account_id = account.id, "login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(account.id, account.role, now).map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            ServiceError::Internal(e.to_string())
        })?;

        tracing::info!(account_id = account.id, role = %account.role, "login succeeded");
        Ok(LoginOutcome {
            user: account.into(),
            token,
        })
    }

    pub fn get_by_id(&self, id: u64) -> ServiceResult<AccountResponse> {
        Ok(self.store.get_by_id(id)?.into())
    }

    /// Apply `patch` to the caller's own account.
    pub fn update_by_id(
        &self,
        caller: &AuthenticatedUser,
        id: &str,
        patch: AccountPatch,
    ) -> ServiceResult<AccountResponse> {
        let id = self.owned_id(caller, id)?;

        let password_hash = match patch.password {
            Some(password) if password.is_empty() => {
                return Err(ServiceError::Validation("password must not be empty".to_string()));
            }
            Some(password) => Some(self.hasher.hash(&password)?),
            None => None,
        };
        let changed = password_hash.is_some();

        let account = self
            .store
            .update_by_id(id, AccountChanges { password_hash })?;

        if changed {
            tracing::info!(account_id = id, "password changed");
        }
        Ok(account.into())
    }

    /// Delete the caller's own account.
    pub fn delete_by_id(&self, caller: &AuthenticatedUser, id: &str) -> ServiceResult<()> {
        let id = self.owned_id(caller, id)?;
        self.store.delete_by_id(id)?;
        tracing::info!(account_id = id, "account deleted");
        Ok(())
    }

    /// Parse `raw` and require that it names the caller's account.
    fn owned_id(&self, caller: &AuthenticatedUser, raw: &str) -> ServiceResult<u64> {
        let id = parse_id(raw)?;
        if !caller.owns_account(id) {
            tracing::warn!(
                caller = caller.account_id,
                target = id,
                "account change refused: not the owner"
            );
            return Err(ServiceError::NotOwner);
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::test_support::temp_database;
    use crate::storage::{AccountRepository, StorageResult, StoredAccount};
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use tempfile::TempDir;

    /// Delegates to a real repository and counts every call.
    struct CountingStore {
        inner: AccountRepository,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl AccountStore for CountingStore {
        fn create(&self, account: NewAccount) -> StorageResult<StoredAccount> {
            self.hit();
            self.inner.create(account)
        }
        fn get_by_id(&self, id: u64) -> StorageResult<StoredAccount> {
            self.hit();
            self.inner.get_by_id(id)
        }
        fn get_by_username(&self, username: &str) -> StorageResult<StoredAccount> {
            self.hit();
            self.inner.get_by_username(username)
        }
        fn exists_by_username(&self, username: &str) -> StorageResult<bool> {
            self.hit();
            self.inner.exists_by_username(username)
        }
        fn update_by_id(&self, id: u64, changes: AccountChanges) -> StorageResult<StoredAccount> {
            self.hit();
            self.inner.update_by_id(id, changes)
        }
        fn delete_by_id(&self, id: u64) -> StorageResult<()> {
            self.hit();
            self.inner.delete_by_id(id)
        }
    }

    struct Fixture {
        service: AccountService,
        store: Arc<CountingStore>,
        tokens: Arc<TokenIssuer>,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let (db, dir) = temp_database();
        let store = Arc::new(CountingStore {
            inner: AccountRepository::new(db),
            calls: AtomicUsize::new(0),
        });
        let tokens = Arc::new(TokenIssuer::new(b"account-service-test-secret"));
        let service = AccountService::new(store.clone(), PasswordHasher::new(), tokens.clone());
        Fixture {
            service,
            store,
            tokens,
            _dir: dir,
        }
    }

    fn caller(account_id: u64) -> AuthenticatedUser {
        AuthenticatedUser {
            account_id,
            role: Role::Receptionist,
            expires_at: Utc::now() + Duration::hours(1),
            token_id: "test".to_string(),
        }
    }

    #[test]
    fn signup_succeeds_once_then_conflicts() {
        let f = fixture();
        let user = f.service.signup("alice", "pw1", "receptionist").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.role, Role::Receptionist);

        let err = f.service.signup("alice", "other", "doctor").unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn signup_stores_a_hash_not_the_password() {
        let f = fixture();
        let user = f.service.signup("alice", "pw1", "doctor").unwrap();
        let stored = f.store.inner.get_by_id(user.id).unwrap();
        assert_ne!(stored.password_hash, "pw1");
        assert!(stored.password_hash.starts_with("$argon2"));
    }

    #[test]
    fn signup_validates_input() {
        let f = fixture();
        assert!(matches!(
            f.service.signup("", "pw1", "doctor"),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            f.service.signup("alice", "", "doctor"),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            f.service.signup("alice", "pw1", "nurse"),
            Err(ServiceError::InvalidRole(_))
        ));
        assert!(matches!(
            f.service.signup("alice", "pw1", "Doctor"),
            Err(ServiceError::InvalidRole(_))
        ));
        assert_eq!(f.store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn login_issues_verifiable_token() {
        let f = fixture();
        let created = f.service.signup("alice", "pw1", "receptionist").unwrap();
        let now = Utc::now();

        let outcome = f.service.login("alice", "pw1", now).unwrap();
        assert_eq!(outcome.user, created);

        let user = f.tokens.verify(&outcome.token.token, now).unwrap();
        assert_eq!(user.account_id, created.id);
        assert_eq!(user.role, Role::Receptionist);
    }

    #[test]
    fn login_failures_are_indistinguishable() {
        let f = fixture();
        f.service.signup("alice", "pw1", "doctor").unwrap();
        let now = Utc::now();

        assert!(matches!(
            f.service.login("alice", "wrong", now),
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            f.service.login("nobody", "pw1", now),
            Err(ServiceError::InvalidCredentials)
        ));
    }

    #[test]
    fn unknown_username_pays_the_hash_cost() {
        let f = fixture();
        f.service.signup("alice", "pw1", "doctor").unwrap();
        let now = Utc::now();

        // Warm up so neither path pays first-call costs.
        let _ = f.service.login("alice", "wrong", now);
        let _ = f.service.login("nobody", "wrong", now);

        let started = Instant::now();
        for _ in 0..3 {
            let _ = f.service.login("alice", "wrong", now);
        }
        let known = started.elapsed();

        let started = Instant::now();
        for _ in 0..3 {
            let _ = f.service.login("nobody", "wrong", now);
        }
        let unknown = started.elapsed();

        assert!(
            unknown * 4 >= known,
            "unknown user took {unknown:?}, known user took {known:?}"
        );
    }

    #[test]
    fn owner_can_change_password() {
        let f = fixture();
        let created = f.service.signup("alice", "pw1", "doctor").unwrap();

        let updated = f
            .service
            .update_by_id(
                &caller(created.id),
                &created.id.to_string(),
                AccountPatch {
                    password: Some("pw2".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated, created);

        let now = Utc::now();
        assert!(f.service.login("alice", "pw2", now).is_ok());
        assert!(matches!(
            f.service.login("alice", "pw1", now),
            Err(ServiceError::InvalidCredentials)
        ));
    }

    #[test]
    fn update_with_bad_id_never_reaches_store() {
        let f = fixture();
        let err = f
            .service
            .update_by_id(&caller(1), "abc", AccountPatch::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidId(_)));
        assert_eq!(f.store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn changing_someone_elses_account_is_refused() {
        let f = fixture();
        let alice = f.service.signup("alice", "pw1", "doctor").unwrap();
        let before = f.store.calls.load(Ordering::SeqCst);

        let err = f
            .service
            .delete_by_id(&caller(alice.id + 1), &alice.id.to_string())
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotOwner));
        assert_eq!(f.store.calls.load(Ordering::SeqCst), before);
    }

    #[test]
    fn empty_password_patch_is_rejected() {
        let f = fixture();
        let alice = f.service.signup("alice", "pw1", "doctor").unwrap();
        let err = f
            .service
            .update_by_id(
                &caller(alice.id),
                &alice.id.to_string(),
                AccountPatch {
                    password: Some(String::new()),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn delete_then_lookup_is_not_found() {
        let f = fixture();
        let alice = f.service.signup("alice", "pw1", "doctor").unwrap();

        f.service
            .delete_by_id(&caller(alice.id), &alice.id.to_string())
            .unwrap();
        assert!(matches!(
            f.service.get_by_id(alice.id),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.service.delete_by_id(&caller(alice.id), &alice.id.to_string()),
            Err(ServiceError::NotFound(_))
        ));
    }
}
