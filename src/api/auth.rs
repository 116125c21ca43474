// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use super::ApiJson;
use crate::{
    error::ApiError,
    models::{AuthResponse, LoginRequest, RegisterRequest},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid username, password or role"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (user, token) = state.accounts.register(request).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (user, token) = state.accounts.login(request).await?;
    Ok(Json(AuthResponse { token, user }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn register_request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: password.into(),
            role: None,
        }
    }

    #[tokio::test]
    async fn register_success() {
        let state = AppState::for_tests();

        let (status, Json(response)) = register(
            State(state.clone()),
            ApiJson(register_request("alice", "secret1")),
        )
        .await
        .expect("registration succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.user.username, "alice");
        assert_eq!(response.user.role, Role::User);

        let claims = state.tokens.validate(&response.token).unwrap();
        assert_eq!(claims.sub, response.user.id);
    }

    #[tokio::test]
    async fn register_duplicate_is_conflict() {
        let state = AppState::for_tests();
        register(State(state.clone()), ApiJson(register_request("alice", "secret1")))
            .await
            .expect("first registration succeeds");

        let err = register(State(state), ApiJson(register_request("alice", "secret2")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn register_short_password_is_bad_request() {
        let state = AppState::for_tests();
        let err = register(State(state), ApiJson(register_request("alice", "123")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_wrong_password_is_unauthorized() {
        let state = AppState::for_tests();
        register(State(state.clone()), ApiJson(register_request("alice", "secret1")))
            .await
            .expect("registration succeeds");

        let err = login(
            State(state),
            ApiJson(LoginRequest {
                username: "alice".into(),
                password: "wrong-pass".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Invalid username or password");
    }
}
