// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence for users and tasks, backed by an embedded redb database.
//!
//! ## Layers
//!
//! - [`UserBackend`] / [`TaskBackend`]: synchronous persistence contracts.
//!   [`RedbStore`] implements both.
//! - [`UserDirectory`] / [`TaskStore`]: async facades used by the API. Every
//!   call runs on the blocking pool under a bounded timeout.
//!
//! ## Access Scoping
//!
//! Task operations take an [`AccessScope`] derived from the caller. Admins are
//! unrestricted; everyone else only ever sees their own tasks. A task outside
//! the scope is indistinguishable from a missing one.

pub mod database;
pub mod ownership;
pub mod tasks;
pub mod users;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::Task;

pub use database::RedbStore;
pub use ownership::{AccessScope, OwnedResource};
pub use tasks::{TaskChanges, TaskStore};
pub use users::{StoredUser, UserDirectory};

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
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

    #[error("username already exists")]
    UsernameExists,

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("store operation timed out: {0}")]
    Timeout(&'static str),

    #[error("store backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Backend Contracts
// =============================================================================

/// Synchronous user persistence.
pub trait UserBackend: Send + Sync + 'static {
    /// Insert a new user. Fails with [`StoreError::UsernameExists`] when the
    /// username is taken; the check and the insert are one atomic step.
    fn insert_user(&self, user: &StoredUser) -> StoreResult<()>;

    fn find_user_by_username(&self, username: &str) -> StoreResult<Option<StoredUser>>;

    fn find_user_by_id(&self, id: &str) -> StoreResult<Option<StoredUser>>;

    /// Set the last-login instant. Returns `false` if the user does not exist.
    fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> StoreResult<bool>;
}

/// Synchronous task persistence, filtered by an [`AccessScope`].
pub trait TaskBackend: Send + Sync + 'static {
    fn find_task(&self, id: &str, scope: &AccessScope) -> StoreResult<Option<Task>>;

    /// All tasks in scope, oldest first.
    fn find_tasks(&self, scope: &AccessScope) -> StoreResult<Vec<Task>>;

    fn insert_task(&self, task: &Task) -> StoreResult<()>;

    /// Apply `changes` to the task if it is in scope, stamping `updated_at`
    /// with `now`. Returns `None` when no visible task matched.
    fn update_task(
        &self,
        id: &str,
        scope: &AccessScope,
        changes: &TaskChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Task>>;

    /// Returns `false` when no visible task matched.
    fn delete_task(&self, id: &str, scope: &AccessScope) -> StoreResult<bool>;
}

// =============================================================================
// Blocking Execution
// =============================================================================

/// Run a backend call on the blocking pool, bounded by `limit`.
///
/// On timeout the caller gets [`StoreError::Timeout`] but the blocking call
/// is only detached, not cancelled: a write that was already running may
/// still commit afterwards. Each backend write is a single redb transaction,
/// so it either lands whole or not at all.
pub(crate) async fn run_blocking<T, F>(limit: Duration, operation: &'static str, f: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(StoreError::Backend(format!(
            "{operation} task failed: {join_error}"
        ))),
        Err(_) => {
            tracing::error!(operation, timeout_ms = limit.as_millis() as u64, "store call timed out");
            Err(StoreError::Timeout(operation))
        }
    }
}
