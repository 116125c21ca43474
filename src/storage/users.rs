// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User directory.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{run_blocking, StoreError, StoreResult, UserBackend};
use crate::auth::Role;
use crate::models::User;

/// Persisted user record, including the password hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl StoredUser {
    /// Build a fresh record with a new ID; last login starts at creation.
    pub fn new(username: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password_hash,
            role,
            created_at: now,
            last_login_at: now,
        }
    }

    /// The outward view, without the hash.
    pub fn to_public(&self) -> User {
        User {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("last_login_at", &self.last_login_at)
            .finish()
    }
}

/// Async user directory over a [`UserBackend`].
#[derive(Clone)]
pub struct UserDirectory {
    backend: Arc<dyn UserBackend>,
    timeout: Duration,
}

impl UserDirectory {
    pub fn new(backend: Arc<dyn UserBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Create a user. Fails with [`StoreError::UsernameExists`] if taken.
    pub async fn create(&self, user: StoredUser) -> StoreResult<StoredUser> {
        let backend = Arc::clone(&self.backend);
        run_blocking(self.timeout, "create_user", move || {
            backend.insert_user(&user)?;
            Ok(user)
        })
        .await
    }

    pub async fn get_by_username(&self, username: &str) -> StoreResult<StoredUser> {
        let backend = Arc::clone(&self.backend);
        let username = username.to_string();
        run_blocking(self.timeout, "get_user_by_username", move || {
            backend
                .find_user_by_username(&username)?
                .ok_or_else(|| StoreError::NotFound("User".into()))
        })
        .await
    }

    pub async fn get_by_id(&self, id: &str) -> StoreResult<StoredUser> {
        let backend = Arc::clone(&self.backend);
        let id = id.to_string();
        run_blocking(self.timeout, "get_user_by_id", move || {
            backend
                .find_user_by_id(&id)?
                .ok_or_else(|| StoreError::NotFound("User".into()))
        })
        .await
    }

    pub async fn update_last_login(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let backend = Arc::clone(&self.backend);
        let id = id.to_string();
        run_blocking(self.timeout, "update_last_login", move || {
            if backend.touch_last_login(&id, at)? {
                Ok(())
            } else {
                Err(StoreError::NotFound("User".into()))
            }
        })
        .await
    }
}
