// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user and task database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `usernames`: username → user_id (uniqueness index)
//! - `tasks`: task_id → serialized Task
//! - `owner_tasks`: composite key (owner_id|task_id) → task_id

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{backends::InMemoryBackend, Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{AccessScope, StoreError, StoreResult, StoredUser, TaskBackend, TaskChanges, UserBackend};
use crate::models::Task;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user_id → serialized StoredUser (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Index: username → user_id. Case-sensitive.
const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("usernames");

/// Primary table: task_id → serialized Task (JSON bytes).
const TASKS: TableDefinition<&str, &[u8]> = TableDefinition::new("tasks");

/// Index: `owner_id|task_id` → task_id, for owner-scoped range scans.
const OWNER_TASKS: TableDefinition<&str, &str> = TableDefinition::new("owner_tasks");

// =============================================================================
// Index Key Helpers
// =============================================================================

fn owner_key(owner_id: &str, task_id: &str) -> String {
    format!("{owner_id}|{task_id}")
}

/// Range bounds covering every `owner_tasks` key of one owner.
///
/// `}` is the byte after `|`, so the upper bound sorts past every key with
/// the prefix.
fn owner_range(owner_id: &str) -> (String, String) {
    (format!("{owner_id}|"), format!("{owner_id}}}"))
}

fn decode_task(bytes: &[u8]) -> StoreResult<Task> {
    Ok(serde_json::from_slice(bytes)?)
}

fn sort_by_creation(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

// =============================================================================
// RedbStore
// =============================================================================

/// Embedded ACID store for users and tasks.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Database::create(path)?)
    }

    /// Open a non-persistent database held entirely in memory.
    pub fn in_memory() -> StoreResult<Self> {
        let db = redb::Builder::new().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAMES)?;
            let _ = write_txn.open_table(TASKS)?;
            let _ = write_txn.open_table(OWNER_TASKS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

// =============================================================================
// Users
// =============================================================================

impl UserBackend for RedbStore {
    fn insert_user(&self, user: &StoredUser) -> StoreResult<()> {
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.begin_write()?;
        let taken = {
            let mut usernames = write_txn.open_table(USERNAMES)?;
            let taken = usernames.get(user.username.as_str())?.is_some();
            if !taken {
                usernames.insert(user.username.as_str(), user.id.as_str())?;
                let mut users = write_txn.open_table(USERS)?;
                users.insert(user.id.as_str(), json.as_slice())?;
            }
            taken
        };

        if taken {
            write_txn.abort()?;
            return Err(StoreError::UsernameExists);
        }
        write_txn.commit()?;
        Ok(())
    }

    fn find_user_by_username(&self, username: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let usernames = read_txn.open_table(USERNAMES)?;
        let user_id = match usernames.get(username)? {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(StoreError::Backend(format!(
                "username index points at missing user {user_id}"
            ))),
        }
    }

    fn find_user_by_id(&self, id: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let found = {
            let mut users = write_txn.open_table(USERS)?;
            let existing: Option<StoredUser> = match users.get(id)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            match existing {
                Some(mut user) => {
                    user.last_login_at = at;
                    let json = serde_json::to_vec(&user)?;
                    users.insert(id, json.as_slice())?;
                    true
                }
                None => false,
            }
        };
        write_txn.commit()?;
        Ok(found)
    }
}

// =============================================================================
// Tasks
// =============================================================================

impl TaskBackend for RedbStore {
    fn find_task(&self, id: &str, scope: &AccessScope) -> StoreResult<Option<Task>> {
        let read_txn = self.db.begin_read()?;
        let tasks = read_txn.open_table(TASKS)?;
        let task = match tasks.get(id)? {
            Some(value) => decode_task(value.value())?,
            None => return Ok(None),
        };
        Ok(scope.permits(&task).then_some(task))
    }

    fn find_tasks(&self, scope: &AccessScope) -> StoreResult<Vec<Task>> {
        let read_txn = self.db.begin_read()?;
        let tasks = read_txn.open_table(TASKS)?;

        let mut results = Vec::new();
        match scope.owner() {
            None => {
                for entry in tasks.iter()? {
                    let (_, value) = entry?;
                    results.push(decode_task(value.value())?);
                }
            }
            Some(owner_id) => {
                let index = read_txn.open_table(OWNER_TASKS)?;
                let (start, end) = owner_range(owner_id);
                for entry in index.range(start.as_str()..end.as_str())? {
                    let (_, task_id) = entry?;
                    let task_id = task_id.value();
                    match tasks.get(task_id)? {
                        Some(value) => results.push(decode_task(value.value())?),
                        None => {
                            tracing::warn!(owner_id, task_id, "owner index entry without task");
                        }
                    }
                }
            }
        }

        sort_by_creation(&mut results);
        Ok(results)
    }

    fn insert_task(&self, task: &Task) -> StoreResult<()> {
        let json = serde_json::to_vec(task)?;

        let write_txn = self.db.begin_write()?;
        let duplicate = {
            let mut tasks = write_txn.open_table(TASKS)?;
            let duplicate = tasks.get(task.id.as_str())?.is_some();
            if !duplicate {
                tasks.insert(task.id.as_str(), json.as_slice())?;
                let mut index = write_txn.open_table(OWNER_TASKS)?;
                let key = owner_key(&task.user_id, &task.id);
                index.insert(key.as_str(), task.id.as_str())?;
            }
            duplicate
        };

        if duplicate {
            write_txn.abort()?;
            return Err(StoreError::DuplicateId(task.id.clone()));
        }
        write_txn.commit()?;
        Ok(())
    }

    fn update_task(
        &self,
        id: &str,
        scope: &AccessScope,
        changes: &TaskChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Task>> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut tasks = write_txn.open_table(TASKS)?;
            let existing = match tasks.get(id)? {
                Some(value) => Some(decode_task(value.value())?),
                None => None,
            };
            match existing {
                Some(mut task) if scope.permits(&task) => {
                    changes.apply(&mut task, now);
                    let json = serde_json::to_vec(&task)?;
                    tasks.insert(id, json.as_slice())?;
                    Some(task)
                }
                _ => None,
            }
        };

        if updated.is_none() {
            write_txn.abort()?;
            return Ok(None);
        }
        write_txn.commit()?;
        Ok(updated)
    }

    fn delete_task(&self, id: &str, scope: &AccessScope) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let owner = {
            let mut tasks = write_txn.open_table(TASKS)?;
            let existing = match tasks.get(id)? {
                Some(value) => Some(decode_task(value.value())?),
                None => None,
            };
            match existing {
                Some(task) if scope.permits(&task) => {
                    tasks.remove(id)?;
                    let mut index = write_txn.open_table(OWNER_TASKS)?;
                    index.remove(owner_key(&task.user_id, id).as_str())?;
                    Some(task.user_id)
                }
                _ => None,
            }
        };

        match owner {
            Some(owner_id) => {
                write_txn.commit()?;
                tracing::debug!(task_id = id, owner_id = %owner_id, "task deleted");
                Ok(true)
            }
            None => {
                write_txn.abort()?;
                Ok(false)
            }
        }
    }
}
