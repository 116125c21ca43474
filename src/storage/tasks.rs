// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access-scoped task store.
//!
//! Every operation takes the caller explicitly. Non-admin callers are
//! filtered to their own tasks, and a task outside the caller's scope yields
//! the same [`StoreError::NotFound`] as a task that does not exist.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{run_blocking, AccessScope, StoreError, StoreResult, TaskBackend};
use crate::auth::AuthenticatedUser;
use crate::models::{CreateTaskRequest, Task, UpdateTaskRequest};

/// The effective field changes of a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    /// Empty or whitespace-only strings count as "not provided".
    pub fn from_request(request: UpdateTaskRequest) -> Self {
        fn provided(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            title: provided(request.title).map(|t| t.trim().to_string()),
            description: provided(request.description),
            completed: request.completed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    /// Apply to a task and stamp `updated_at`.
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        task.updated_at = now;
    }
}

fn task_not_found() -> StoreError {
    StoreError::NotFound("Task".into())
}

/// Async task store over a [`TaskBackend`].
#[derive(Clone)]
pub struct TaskStore {
    backend: Arc<dyn TaskBackend>,
    timeout: Duration,
}

impl TaskStore {
    pub fn new(backend: Arc<dyn TaskBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub async fn get_by_id(&self, id: &str, caller: &AuthenticatedUser) -> StoreResult<Task> {
        let backend = Arc::clone(&self.backend);
        let scope = AccessScope::for_user(caller);
        let id = id.to_string();
        run_blocking(self.timeout, "get_task", move || {
            backend.find_task(&id, &scope)?.ok_or_else(task_not_found)
        })
        .await
    }

    /// Tasks visible to the caller, oldest first.
    pub async fn get_all(&self, caller: &AuthenticatedUser) -> StoreResult<Vec<Task>> {
        let backend = Arc::clone(&self.backend);
        let scope = AccessScope::for_user(caller);
        run_blocking(self.timeout, "list_tasks", move || backend.find_tasks(&scope)).await
    }

    /// Create a task owned by the caller.
    pub async fn create(
        &self,
        caller: &AuthenticatedUser,
        request: CreateTaskRequest,
    ) -> StoreResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title.trim().to_string(),
            description: request.description,
            completed: request.completed,
            user_id: caller.user_id.clone(),
            created_at: now,
            updated_at: now,
        };

        let backend = Arc::clone(&self.backend);
        run_blocking(self.timeout, "create_task", move || {
            backend.insert_task(&task)?;
            Ok(task)
        })
        .await
    }

    /// Partially update a visible task.
    ///
    /// An update with no effective fields returns the task unchanged.
    pub async fn update(
        &self,
        id: &str,
        caller: &AuthenticatedUser,
        request: UpdateTaskRequest,
    ) -> StoreResult<Task> {
        let changes = TaskChanges::from_request(request);
        if changes.is_empty() {
            return self.get_by_id(id, caller).await;
        }

        let backend = Arc::clone(&self.backend);
        let scope = AccessScope::for_user(caller);
        let id = id.to_string();
        run_blocking(self.timeout, "update_task", move || {
            backend
                .update_task(&id, &scope, &changes, Utc::now())?
                .ok_or_else(task_not_found)
        })
        .await
    }

    pub async fn delete(&self, id: &str, caller: &AuthenticatedUser) -> StoreResult<()> {
        let backend = Arc::clone(&self.backend);
        let scope = AccessScope::for_user(caller);
        let id = id.to_string();
        run_blocking(self.timeout, "delete_task", move || {
            if backend.delete_task(&id, &scope)? {
                Ok(())
            } else {
                Err(task_not_found())
            }
        })
        .await
    }
}
