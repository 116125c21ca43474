// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::{AdminOnly, Auth, AuthenticatedUser},
    error::ApiError,
    models::UserResponse,
    state::AppState,
};

/// Get current user info.
///
/// Returns the identity carried by the caller's token.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user info", body = AuthenticatedUser),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<AuthenticatedUser> {
    Json(user)
}

/// Look up any account by ID. Admin only.
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(
        ("id" = String, Path, description = "User identifier")
    ),
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Path(id): Path<String>,
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
) -> Result<Json<UserResponse>, ApiError> {
    tracing::debug!(admin_id = %admin.user_id, target_id = %id, "admin user lookup");
    let user = state.accounts.get_user(&id).await?;
    Ok(Json(UserResponse { user }))
}
