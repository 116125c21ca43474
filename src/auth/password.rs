// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential hashing with Argon2id.
//!
//! Hashes are stored in PHC string format, so the salt and the cost
//! parameters travel with each hash and verification keeps working after
//! the configured cost changes.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Errors from the credential hasher.
///
/// A wrong password is not an error: [`CredentialHasher::verify`] returns
/// `Ok(false)` for it.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashCost {
    /// OWASP minimum for Argon2id: m=19456 KiB, t=2, p=1.
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Plaintext behind the decoy hash. Never stored for any account.
const DECOY_PASSWORD: &str = "decoy-credential-for-unknown-accounts";

/// One-way password hasher.
///
/// Cheap to clone; the cost is fixed at construction.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
    /// Hash at the configured cost, verified against when the account is
    /// unknown so that both login failure paths do the same work.
    decoy_hash: Arc<str>,
}

impl CredentialHasher {
    pub fn new(cost: HashCost) -> Result<Self, HashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| HashError::InvalidParams(e.to_string()))?;
        let mut hasher = Self {
            params,
            decoy_hash: Arc::from(""),
        };
        hasher.decoy_hash = Arc::from(hasher.hash(DECOY_PASSWORD)?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Hashing(e.to_string()))
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// The comparison is done by argon2 in constant time. The parameters
    /// embedded in the stored hash are used, not the configured ones.
    pub fn verify(&self, stored_hash: &str, plaintext: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|e| HashError::MalformedHash(e.to_string()))?;

        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::MalformedHash(e.to_string())),
        }
    }

    /// Run a full verification against the decoy hash and report no match.
    ///
    /// Used on the unknown-account login path.
    pub fn verify_decoy(&self, plaintext: &str) -> bool {
        if let Err(e) = self.verify(&self.decoy_hash, plaintext) {
            tracing::warn!(error = %e, "decoy verification failed");
        }
        false
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("memory_kib", &self.params.m_cost())
            .field("iterations", &self.params.t_cost())
            .field("parallelism", &self.params.p_cost())
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> CredentialHasher {
    CredentialHasher::new(HashCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid test params")
}
