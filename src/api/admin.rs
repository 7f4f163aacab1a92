use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::accounts::{into_stats_patch, validate_stats_patch};
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{AdminUserCreateRequest, AdminUserUpdateRequest, UserDto};
use crate::db::UserPatch;

/// GET /admin/users/ (staff)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state
        .store()
        .list_users()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list users: {e}")))?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// GET /admin/users/{id}/ (staff)
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .store()
        .get_user(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /admin/users/ (staff)
/// Goes through the same transactional constructor as registration, so
/// admin-created accounts get their game stats too.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdminUserCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let taken = state
        .store()
        .username_exists(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check username: {e}")))?;
    if taken {
        return Err(ApiError::validation("Username is already taken"));
    }

    let user = state
        .store()
        .create_user(
            &payload.username,
            &payload.password,
            payload.email.as_deref().unwrap_or_default(),
            payload.is_staff,
            &state.config.security,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// PUT/PATCH /admin/users/{id}/ (staff)
/// Unlike self-service PATCH, this may change the staff flag.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<AdminUserUpdateRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if let Some(username) = &payload.username {
        if username.trim().is_empty() {
            return Err(ApiError::validation("Username cannot be empty"));
        }

        let current = state
            .store()
            .get_user(id)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
            .ok_or_else(|| ApiError::not_found("User", id))?;

        if username != &current.username {
            let taken = state
                .store()
                .username_exists(username)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to check username: {e}")))?;
            if taken {
                return Err(ApiError::validation("Username is already taken"));
            }
        }
    }

    let stats = payload
        .usergamestats
        .map(|patch| validate_stats_patch(&patch, &state).map(|()| into_stats_patch(patch)))
        .transpose()?;

    let patch = UserPatch {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        is_staff: payload.is_staff,
        stats,
    };

    let user = state
        .store()
        .update_user(id, patch, &state.config.security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// DELETE /admin/users/{id}/ (staff)
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .store()
        .delete_user(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete user: {e}")))?;

    if !deleted {
        return Err(ApiError::not_found("User", id));
    }

    Ok(StatusCode::NO_CONTENT)
}
