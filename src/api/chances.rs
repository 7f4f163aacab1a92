use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{ChanceCreateRequest, ChanceDto, ChanceUpdateRequest};

/// GET /chances/ (also served at /accounts/chances/)
/// Full catalog dump, open to unauthenticated callers.
pub async fn list_chances(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ChanceDto>>>, ApiError> {
    let chances = state
        .store()
        .list_chances()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list chances: {e}")))?;

    Ok(Json(ApiResponse::success(
        chances.into_iter().map(ChanceDto::from).collect(),
    )))
}

/// GET /chances/{id}/
pub async fn get_chance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ChanceDto>>, ApiError> {
    let chance = state
        .store()
        .get_chance(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get chance: {e}")))?
        .ok_or_else(|| ApiError::not_found("Chance", id))?;

    Ok(Json(ApiResponse::success(ChanceDto::from(chance))))
}

/// POST /chances/ (staff)
pub async fn create_chance(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChanceCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.description.trim().is_empty() {
        return Err(ApiError::validation("Description is required"));
    }

    let chance = state
        .store()
        .create_chance(&payload.description, payload.score_to_award)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create chance: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ChanceDto::from(chance))),
    ))
}

/// PUT/PATCH /chances/{id}/ (staff)
pub async fn update_chance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ChanceUpdateRequest>,
) -> Result<Json<ApiResponse<ChanceDto>>, ApiError> {
    if let Some(description) = &payload.description
        && description.trim().is_empty()
    {
        return Err(ApiError::validation("Description cannot be empty"));
    }

    let chance = state
        .store()
        .update_chance(id, payload.description.as_deref(), payload.score_to_award)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update chance: {e}")))?
        .ok_or_else(|| ApiError::not_found("Chance", id))?;

    Ok(Json(ApiResponse::success(ChanceDto::from(chance))))
}

/// DELETE /chances/{id}/ (staff)
pub async fn delete_chance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .store()
        .delete_chance(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete chance: {e}")))?;

    if !deleted {
        return Err(ApiError::not_found("Chance", id));
    }

    Ok(StatusCode::NO_CONTENT)
}
