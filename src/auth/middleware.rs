// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and role middleware for Axum.
//!
//! ```rust,ignore
//! let admin = Router::new()
//!     .route("/admin/users/{id}", get(get_user))
//!     .route_layer(from_fn(require_admin))
//!     .route_layer(from_fn_with_state(state.clone(), require_auth));
//! ```
//!
//! The last `route_layer` runs first, so the identity check always wraps the
//! role check.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, AuthenticatedUser, TokenService};
use crate::state::AppState;

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively and the header must have
/// exactly two space-separated parts.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Validate the bearer token in `headers` and return the caller.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = tokens.validate(token)?;
    Ok(AuthenticatedUser::from_claims(claims))
}

/// Identity check: reject the request unless it carries a valid token, and
/// attach the [`AuthenticatedUser`] to the request extensions.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match authenticate(request.headers(), &state.tokens) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Role check: only admins pass. Must run after [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    let rejection = match request.extensions().get::<AuthenticatedUser>() {
        None => Some(AuthError::Unauthenticated),
        Some(user) if !user.is_admin() => {
            tracing::warn!(
                user_id = %user.user_id,
                path = %request.uri().path(),
                "admin access denied"
            );
            Some(AuthError::InsufficientPermissions)
        }
        Some(_) => None,
    };

    match rejection {
        Some(e) => e.into_response(),
        None => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use axum::{
        body::{to_bytes, Body},
        http::{HeaderValue, StatusCode},
        middleware::{from_fn, from_fn_with_state},
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("BEARER abc")), Ok("abc"));

        assert_eq!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingAuthHeader)
        );
        for bad in ["abc", "Basic abc", "Bearer", "Bearer ", "Bearer a b", "Bearer  abc"] {
            assert_eq!(
                bearer_token(&headers(bad)),
                Err(AuthError::InvalidAuthHeader),
                "{bad:?}"
            );
        }
    }

    async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
        user.username
    }

    fn app(state: AppState) -> Router {
        let protected = Router::new()
            .route("/me", get(whoami))
            .route_layer(from_fn_with_state(state.clone(), require_auth));
        let admin = Router::new()
            .route("/admin", get(whoami))
            .route_layer(from_fn(require_admin))
            .route_layer(from_fn_with_state(state.clone(), require_auth));
        let unguarded = Router::new()
            .route("/unguarded-admin", get(|| async { "reached" }))
            .route_layer(from_fn(require_admin));
        protected.merge(admin).merge(unguarded).with_state(state)
    }

    async fn call(app: Router, path: &str, auth: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = axum::http::Request::builder().uri(path);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ));
        (status, body)
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_identity() {
        let state = AppState::for_tests();
        let token = state.tokens.issue("u1", "alice", Role::User).unwrap();

        let (status, body) = call(app(state), "/me", Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn missing_and_invalid_tokens_are_rejected() {
        let state = AppState::for_tests();

        let (status, body) = call(app(state.clone()), "/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "missing_auth_header");

        let (status, body) = call(app(state), "/me", Some("Bearer not-a-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "invalid_token");
    }

    #[tokio::test]
    async fn admin_gate_checks_role() {
        let state = AppState::for_tests();
        let user_token = state.tokens.issue("u1", "alice", Role::User).unwrap();
        let admin_token = state.tokens.issue("a1", "root", Role::Admin).unwrap();

        let (status, body) = call(app(state.clone()), "/admin", Some(&format!("Bearer {user_token}"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "insufficient_permissions");

        let (status, body) = call(app(state.clone()), "/admin", Some(&format!("Bearer {admin_token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "root");

        // Identity check runs first: an invalid token never reaches the role check.
        let (status, body) = call(app(state), "/admin", Some("Bearer forged")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "invalid_token");
    }

    #[tokio::test]
    async fn admin_gate_without_identity_is_unauthenticated() {
        let state = AppState::for_tests();
        let (status, body) = call(app(state), "/unguarded-admin", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "unauthenticated");
    }
}
