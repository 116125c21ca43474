// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AccountService, CredentialHasher, TokenService};
use crate::storage::{RedbStore, TaskStore, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskStore,
    pub accounts: AccountService,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        store: Arc<RedbStore>,
        tokens: TokenService,
        hasher: CredentialHasher,
        store_timeout: Duration,
    ) -> Self {
        let tokens = Arc::new(tokens);
        let users = UserDirectory::new(store.clone(), store_timeout);
        Self {
            tasks: TaskStore::new(store, store_timeout),
            accounts: AccountService::new(users, hasher, Arc::clone(&tokens)),
            tokens,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory database, cheap hashing and a fixed signing secret.
    pub fn for_tests() -> Self {
        let store = Arc::new(RedbStore::in_memory().expect("in-memory database"));
        let tokens = TokenService::new(
            b"test-secret-key-minimum-32-characters-long",
            chrono::Duration::hours(crate::auth::DEFAULT_TOKEN_TTL_HOURS),
        );
        Self::new(
            store,
            tokens,
            crate::auth::password::fast_hasher(),
            crate::storage::DEFAULT_STORE_TIMEOUT,
        )
    }
}
