use axum::{
    Json,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{RefreshRequest, TokenPairResponse, TokenRequest};
use crate::config::AuthConfig;
use crate::db::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id.
    pub sub: i32,
    pub username: String,
    pub is_staff: bool,
    pub kind: TokenKind,
    pub iat: u64,
    pub exp: u64,
}

pub fn create_token(
    secret: &str,
    user: &User,
    kind: TokenKind,
    expire_secs: u64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        is_staff: user.is_staff,
        kind,
        iat: now,
        exp: now + expire_secs,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn validate_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Issue a fresh access/refresh pair for the user.
pub fn issue_pair(auth: &AuthConfig, user: &User) -> anyhow::Result<TokenPairResponse> {
    Ok(TokenPairResponse {
        access: create_token(&auth.jwt_secret, user, TokenKind::Access, auth.access_ttl_secs)?,
        refresh: create_token(
            &auth.jwt_secret,
            user,
            TokenKind::Refresh,
            auth.refresh_ttl_secs,
        )?,
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Bearer-token middleware. Validates the access token and stashes its
/// claims in request extensions for handlers to read.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = auth_header
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing or malformed authorization header"))?;

    let claims = validate_token(&state.config.auth.jwt_secret, token).map_err(|e| {
        if matches!(
            e.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ) {
            ApiError::unauthorized("Token expired")
        } else {
            ApiError::unauthorized("Invalid token")
        }
    })?;

    if claims.kind != TokenKind::Access {
        return Err(ApiError::unauthorized("Invalid token"));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Staff gate, layered inside `auth_middleware` on privileged routes.
pub async fn require_staff(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_staff = request
        .extensions()
        .get::<Claims>()
        .is_some_and(|claims| claims.is_staff);

    if !is_staff {
        return Err(ApiError::forbidden(
            "You do not have permission to perform this action",
        ));
    }

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /accounts/token/
/// Exchange username + password for an access/refresh pair.
pub async fn obtain_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<ApiResponse<TokenPairResponse>>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let is_valid = state
        .store()
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let pair = issue_pair(&state.config.auth, &user)
        .map_err(|e| ApiError::internal(format!("Failed to create token: {e}")))?;

    Ok(Json(ApiResponse::success(pair)))
}

/// POST /accounts/token/refresh/
/// Rotate a refresh token into a new access/refresh pair.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPairResponse>>, ApiError> {
    let claims = validate_token(&state.config.auth.jwt_secret, &payload.refresh)
        .map_err(|_| ApiError::unauthorized("Invalid or expired refresh token"))?;

    if claims.kind != TokenKind::Refresh {
        return Err(ApiError::unauthorized("Invalid or expired refresh token"));
    }

    // Reload the user so a deleted account or changed staff flag takes
    // effect at rotation time.
    let user = state
        .store()
        .get_user(claims.sub)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired refresh token"))?;

    let pair = issue_pair(&state.config.auth, &user)
        .map_err(|e| ApiError::internal(format!("Failed to create token: {e}")))?;

    Ok(Json(ApiResponse::success(pair)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::GameStats;

    fn test_user(is_staff: bool) -> User {
        User {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.org".to_string(),
            is_staff,
            created_at: chrono::Utc::now().to_rfc3339(),
            stats: GameStats {
                current_square: 0,
                current_task: -1,
                task_completed: false,
                score: 0,
            },
        }
    }

    #[test]
    fn claims_round_trip() {
        let token = create_token("secret", &test_user(true), TokenKind::Access, 60).unwrap();
        let claims = validate_token("secret", &token).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "alice");
        assert!(claims.is_staff);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = create_token("secret", &test_user(false), TokenKind::Access, 60).unwrap();
        assert!(validate_token("other-secret", &token).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        // exp is already in the past; Validation::default() allows no leeway
        // beyond its 60s default, so back-date well past it.
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: 7,
            username: "alice".to_string(),
            is_staff: false,
            kind: TokenKind::Access,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = validate_token("secret", &token).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn pair_has_distinct_kinds() {
        let auth = AuthConfig::default();
        let pair = issue_pair(&auth, &test_user(false)).unwrap();

        let access = validate_token(&auth.jwt_secret, &pair.access).unwrap();
        let refresh = validate_token(&auth.jwt_secret, &pair.refresh).unwrap();

        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(refresh.kind, TokenKind::Refresh);
    }
}
