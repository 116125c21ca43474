// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::ApiJson;
use crate::{
    auth::Auth,
    error::ApiError,
    models::{
        CreateTaskRequest, MessageResponse, TaskListResponse, TaskResponse, UpdateTaskRequest,
    },
    state::AppState,
};

/// Reject IDs that are not UUIDs before touching the store.
fn parse_task_id(raw: &str) -> Result<String, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| ApiError::bad_request("Invalid task ID"))
}

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Tasks visible to the caller, oldest first", body = TaskListResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<TaskListResponse>, ApiError> {
    let tasks = state.tasks.get_all(&user).await?;
    Ok(Json(TaskListResponse { tasks }))
}

#[utoipa::path(
    post,
    path = "/tasks",
    request_body = CreateTaskRequest,
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Task created and owned by the caller", body = TaskResponse),
        (status = 400, description = "Missing title or malformed body"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }

    let task = state.tasks.create(&user, request).await?;
    tracing::info!(task_id = %task.id, user_id = %user.user_id, "task created");
    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    params(
        ("id" = String, Path, description = "Task identifier (UUID)")
    ),
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, body = TaskResponse),
        (status = 400, description = "Invalid task ID"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = parse_task_id(&id)?;
    let task = state.tasks.get_by_id(&id, &user).await?;
    Ok(Json(TaskResponse { task }))
}

#[utoipa::path(
    put,
    path = "/tasks/{id}",
    params(
        ("id" = String, Path, description = "Task identifier (UUID)")
    ),
    request_body = UpdateTaskRequest,
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, body = TaskResponse),
        (status = 400, description = "Invalid task ID or malformed body"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_task(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = parse_task_id(&id)?;
    let task = state.tasks.update(&id, &user, request).await?;
    Ok(Json(TaskResponse { task }))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(
        ("id" = String, Path, description = "Task identifier (UUID)")
    ),
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, body = MessageResponse),
        (status = 400, description = "Invalid task ID"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_task_id(&id)?;
    state.tasks.delete(&id, &user).await?;
    tracing::info!(task_id = %id, user_id = %user.user_id, "task deleted");
    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}
