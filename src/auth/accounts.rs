// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login.
//!
//! Composes the credential hasher, the user directory and the token service.
//! Hashing runs on the blocking pool.

use std::sync::Arc;

use chrono::Utc;

use super::{AuthError, CredentialHasher, HashError, TokenService};
use crate::models::{LoginRequest, RegisterRequest, User};
use crate::storage::{StoreError, StoredUser, UserDirectory};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Token(#[from] AuthError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Account use cases.
#[derive(Clone)]
pub struct AccountService {
    users: UserDirectory,
    hasher: CredentialHasher,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(users: UserDirectory, hasher: CredentialHasher, tokens: Arc<TokenService>) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Create an account and return it with a fresh token.
    pub async fn register(&self, request: RegisterRequest) -> Result<(User, String), AccountError> {
        let username = request.username.trim().to_string();
        if username.is_empty() {
            return Err(AccountError::Validation("Username is required".into()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let hasher = self.hasher.clone();
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let role = request.role.unwrap_or_default();
        let user = self
            .users
            .create(StoredUser::new(username, password_hash, role))
            .await
            .map_err(|e| match e {
                StoreError::UsernameExists => AccountError::UsernameTaken,
                other => AccountError::Store(other),
            })?;

        let token = self.tokens.issue(&user.id, &user.username, user.role)?;
        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok((user.to_public(), token))
    }

    /// Check credentials and return the account with a fresh token.
    ///
    /// An unknown username and a wrong password produce the same error.
    pub async fn login(&self, request: LoginRequest) -> Result<(User, String), AccountError> {
        let mut user = match self.users.get_by_username(request.username.trim()).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                tracing::debug!("login for unknown username");
                let hasher = self.hasher.clone();
                let password = request.password;
                tokio::task::spawn_blocking(move || hasher.verify_decoy(&password)).await?;
                return Err(AccountError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let hasher = self.hasher.clone();
        let stored_hash = user.password_hash.clone();
        let password = request.password;
        let matches =
            tokio::task::spawn_blocking(move || hasher.verify(&stored_hash, &password)).await??;
        if !matches {
            tracing::debug!(user_id = %user.id, "login with wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        let now = Utc::now();
        match self.users.update_last_login(&user.id, now).await {
            Ok(()) => user.last_login_at = now,
            Err(e) => tracing::warn!(user_id = %user.id, error = %e, "failed to record last login"),
        }

        let token = self.tokens.issue(&user.id, &user.username, user.role)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok((user.to_public(), token))
    }

    pub async fn get_user(&self, id: &str) -> Result<User, AccountError> {
        match self.users.get_by_id(id).await {
            Ok(user) => Ok(user.to_public()),
            Err(StoreError::NotFound(_)) => Err(AccountError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }
}
