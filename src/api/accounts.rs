use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::Claims;
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{
    ChangePasswordRequest, ForgotPasswordRequest, GameStatsPatchDto, MeUpdateRequest,
    MessageResponse, RankedQuery, RegisterRequest, ResetPasswordRequest, UserDto,
};
use crate::db::{GameStatsPatch, UserPatch};

/// Response for forgot-password regardless of whether the username exists,
/// so the endpoint cannot be used to enumerate accounts.
const FORGOT_PASSWORD_MESSAGE: &str = "If the username exists, a reset link has been sent.";

const MIN_PASSWORD_LEN: usize = 8;

/// POST /accounts/user/register/
/// Create an account; the game-stats row is provisioned in the same
/// transaction.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }
    if let Some(confirm) = &payload.password_confirm
        && confirm != &payload.password
    {
        return Err(ApiError::validation("Passwords do not match"));
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
            false,
            &state.config.security,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?;

    tracing::info!("Registered user: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// GET /accounts/me/
/// The caller's own profile and game stats; the record is always resolved
/// from the bearer token, never from a client-supplied id.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .store()
        .get_user(claims.sub)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PATCH /accounts/me/
/// Partial update of the caller's profile and/or game stats. The staff
/// flag cannot be changed here; that goes through the admin API.
pub async fn patch_me(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<MeUpdateRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let current = state
        .store()
        .get_user(claims.sub)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    if let Some(username) = &payload.username {
        if username.trim().is_empty() {
            return Err(ApiError::validation("Username cannot be empty"));
        }
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
    if let Some(password) = &payload.password
        && password.len() < MIN_PASSWORD_LEN
    {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    let stats = payload
        .usergamestats
        .map(|patch| validate_stats_patch(&patch, &state).map(|()| into_stats_patch(patch)))
        .transpose()?;

    let patch = UserPatch {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        is_staff: None,
        stats,
    };

    let user = state
        .store()
        .update_user(claims.sub, patch, &state.config.security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update user: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// GET /accounts/ranked-users/
/// Leaderboard: all users ordered by score descending. `limit`/`offset`
/// are optional; omitting them returns the full list.
pub async fn ranked_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RankedQuery>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state
        .store()
        .ranked_users(query.limit, query.offset)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to query leaderboard: {e}")))?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// POST /accounts/change-password/
/// Requires the current password; the stored hash is untouched on failure.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(
            "New password must be at least 8 characters",
        ));
    }

    let is_valid = state
        .store()
        .verify_user_password_by_id(claims.sub, &payload.old_password)
        .await
        .map_err(|e| ApiError::internal(format!("Password verification error: {e}")))?;

    if !is_valid {
        return Err(ApiError::validation("Incorrect old password"));
    }

    state
        .store()
        .set_user_password(claims.sub, &payload.new_password, &state.config.security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update password: {e}")))?;

    tracing::info!("Password changed for user: {}", claims.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password changed successfully".to_string(),
    })))
}

/// POST /accounts/forgot-password-request/
/// Mints a reset token and emails a link. A lookup miss is silently
/// absorbed; the response never discloses whether the account exists,
/// and email failures are logged rather than surfaced.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?;

    if let Some(user) = user {
        let token = state
            .store()
            .create_reset_token(user.id)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create reset token: {e}")))?;

        let reset_link = format!(
            "{}/forgot-password?user_id={}&token={}",
            state.config.email.frontend_url.trim_end_matches('/'),
            user.id,
            token
        );

        let body = format!("Click the link to reset your password: {reset_link}");
        if let Err(e) = state.mailer.send(&user.email, "Password Reset", &body).await {
            tracing::error!("Failed to send reset email to {}: {e}", user.email);
        }
    } else {
        tracing::debug!("Reset requested for unknown username");
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: FORGOT_PASSWORD_MESSAGE.to_string(),
    })))
}

/// POST /accounts/reset-password/
/// Consume a reset token. Unknown user and unknown token produce the same
/// error so the endpoint cannot distinguish the two for a caller.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let (user_id, token, new_password) = match (
        payload.user_id,
        payload.token.as_deref(),
        payload.new_password.as_deref(),
    ) {
        (Some(user_id), Some(token), Some(new_password))
            if !token.is_empty() && !new_password.is_empty() =>
        {
            (user_id, token, new_password)
        }
        _ => return Err(ApiError::validation("Missing data")),
    };

    let user = state
        .store()
        .get_user(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::validation("Invalid token or user"))?;

    let reset_token = state
        .store()
        .find_reset_token(user.id, token)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to query reset token: {e}")))?
        .ok_or_else(|| ApiError::validation("Invalid token or user"))?;

    if reset_token.is_expired_at(chrono::Utc::now()) {
        return Err(ApiError::validation("Token expired"));
    }

    state
        .store()
        .set_user_password(user.id, new_password, &state.config.security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update password: {e}")))?;

    // Single use: the token row goes away with the successful reset.
    state
        .store()
        .delete_reset_token(reset_token.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete reset token: {e}")))?;

    tracing::info!("Password reset for user: {}", user.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password reset successful".to_string(),
    })))
}

/// DELETE /accounts/delete/
/// Self-delete; stats and outstanding reset tokens go with the user row.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let deleted = state
        .store()
        .delete_user(claims.sub)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete user: {e}")))?;

    if !deleted {
        return Err(ApiError::unauthorized("User not found"));
    }

    tracing::info!("Deleted account: {}", claims.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("User '{}' deleted successfully.", claims.username),
    })))
}

/// Board-range checks shared with the admin API.
pub fn validate_stats_patch(
    patch: &GameStatsPatchDto,
    state: &AppState,
) -> Result<(), ApiError> {
    let board_size = state.config.game.board_size;

    if let Some(square) = patch.current_square
        && !(0..board_size).contains(&square)
    {
        return Err(ApiError::validation(format!(
            "current_square must be within the board (0..{board_size})"
        )));
    }

    if let Some(task) = patch.current_task
        && task < -1
    {
        return Err(ApiError::validation(
            "current_task must be -1 (none) or a task index",
        ));
    }

    Ok(())
}

pub fn into_stats_patch(patch: GameStatsPatchDto) -> GameStatsPatch {
    GameStatsPatch {
        current_square: patch.current_square,
        current_task: patch.current_task,
        task_completed: patch.task_completed,
        score: patch.score,
    }
}
