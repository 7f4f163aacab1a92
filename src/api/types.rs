use serde::{Deserialize, Serialize};

use crate::db::{ChanceRow, TaskRow, User};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Users & game stats
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GameStatsDto {
    pub current_square: i32,
    pub current_task: i32,
    pub task_completed: bool,
    pub score: i32,
}

/// User representation returned by the API. The password hash never
/// leaves the repository layer.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub usergamestats: GameStatsDto,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
            usergamestats: GameStatsDto {
                current_square: user.stats.current_square,
                current_task: user.stats.current_task,
                task_completed: user.stats.task_completed,
                score: user.stats.score,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Optional confirmation; must match `password` when present.
    pub password_confirm: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GameStatsPatchDto {
    pub current_square: Option<i32>,
    pub current_task: Option<i32>,
    pub task_completed: Option<bool>,
    pub score: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct MeUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub usergamestats: Option<GameStatsPatchDto>,
}

#[derive(Debug, Deserialize)]
pub struct RankedQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

// ============================================================================
// Account lifecycle
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
}

/// All three fields are required; any absent one yields "Missing data".
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub user_id: Option<i32>,
    pub token: Option<String>,
    pub new_password: Option<String>,
}

// ============================================================================
// Catalogs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TaskDto {
    pub id: i32,
    pub description: String,
    pub applicable_squares: Vec<i32>,
    pub score_to_award: i32,
}

impl From<TaskRow> for TaskDto {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            description: row.description,
            applicable_squares: row.applicable_squares,
            score_to_award: row.score_to_award,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChanceDto {
    pub id: i32,
    pub description: String,
    pub score_to_award: i32,
}

impl From<ChanceRow> for ChanceDto {
    fn from(row: ChanceRow) -> Self {
        Self {
            id: row.id,
            description: row.description,
            score_to_award: row.score_to_award,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskCreateRequest {
    pub description: String,
    #[serde(default)]
    pub applicable_squares: Vec<i32>,
    /// Matches the catalog's historical default point value.
    #[serde(default = "default_task_score")]
    pub score_to_award: i32,
}

const fn default_task_score() -> i32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct TaskUpdateRequest {
    pub description: Option<String>,
    pub applicable_squares: Option<Vec<i32>>,
    pub score_to_award: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ChanceCreateRequest {
    pub description: String,
    #[serde(default)]
    pub score_to_award: i32,
}

#[derive(Debug, Deserialize)]
pub struct ChanceUpdateRequest {
    pub description: Option<String>,
    pub score_to_award: Option<i32>,
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AdminUserCreateRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminUserUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
    pub usergamestats: Option<GameStatsPatchDto>,
}
