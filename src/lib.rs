// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Task Manager - Authenticated Task API Service
//!
//! Users register and log in with a password, receive a signed session
//! token, and manage tasks that only they (or an admin) can see.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credential hashing, session tokens and the authorization gate
//! - `storage` - Embedded database (redb), user directory and scoped task store

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod storage;
