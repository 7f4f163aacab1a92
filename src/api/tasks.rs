use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{TaskCreateRequest, TaskDto, TaskUpdateRequest};

/// GET /tasks/ (also served at /accounts/tasks/)
/// Full catalog dump, open to unauthenticated callers.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TaskDto>>>, ApiError> {
    let tasks = state
        .store()
        .list_tasks()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list tasks: {e}")))?;

    Ok(Json(ApiResponse::success(
        tasks.into_iter().map(TaskDto::from).collect(),
    )))
}

/// GET /tasks/{id}/
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TaskDto>>, ApiError> {
    let task = state
        .store()
        .get_task(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get task: {e}")))?
        .ok_or_else(|| ApiError::not_found("Task", id))?;

    Ok(Json(ApiResponse::success(TaskDto::from(task))))
}

/// POST /tasks/ (staff)
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TaskCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.description.trim().is_empty() {
        return Err(ApiError::validation("Description is required"));
    }

    let task = state
        .store()
        .create_task(
            &payload.description,
            &payload.applicable_squares,
            payload.score_to_award,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create task: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TaskDto::from(task))),
    ))
}

/// PUT/PATCH /tasks/{id}/ (staff)
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<TaskUpdateRequest>,
) -> Result<Json<ApiResponse<TaskDto>>, ApiError> {
    if let Some(description) = &payload.description
        && description.trim().is_empty()
    {
        return Err(ApiError::validation("Description cannot be empty"));
    }

    let task = state
        .store()
        .update_task(
            id,
            payload.description.as_deref(),
            payload.applicable_squares.as_deref(),
            payload.score_to_award,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update task: {e}")))?
        .ok_or_else(|| ApiError::not_found("Task", id))?;

    Ok(Json(ApiResponse::success(TaskDto::from(task))))
}

/// DELETE /tasks/{id}/ (staff)
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .store()
        .delete_task(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete task: {e}")))?;

    if !deleted {
        return Err(ApiError::not_found("Task", id));
    }

    Ok(StatusCode::NO_CONTENT)
}
