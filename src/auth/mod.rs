// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Password-based accounts with signed session tokens.
//!
//! ## Auth Flow
//!
//! 1. Client registers or logs in with username and password
//! 2. Server verifies the Argon2id hash and issues an HS256 token
//! 3. Client sends `Authorization: Bearer <token>`
//! 4. Server:
//!    - Verifies signature, algorithm and expiry
//!    - Extracts:
//!      - `sub` → canonical `user_id`
//!      - `role` → `admin` or `user`
//!
//! ## Security
//!
//! - All task and user endpoints require authentication
//! - Token failures of every kind look identical to the caller
//! - Admin-only routes are wrapped by the identity check first

pub mod accounts;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod token;

pub use accounts::{AccountError, AccountService};
pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use middleware::{require_admin, require_auth};
pub use password::{CredentialHasher, HashCost, HashError};
pub use roles::Role;
pub use token::{TokenService, DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};
