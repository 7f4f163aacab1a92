use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use greenboard::api::AppState;
use greenboard::config::Config;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.auth.jwt_secret = "test-secret".to_string();

    let state = greenboard::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    (greenboard::api::router(state.clone()), state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, username: &str, password: &str) {
    let (status, _) = request(
        app,
        "POST",
        "/accounts/user/register/",
        None,
        Some(serde_json::json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn obtain_pair(
    app: &Router,
    username: &str,
    password: &str,
) -> (StatusCode, serde_json::Value) {
    request(
        app,
        "POST",
        "/accounts/token/",
        None,
        Some(serde_json::json!({"username": username, "password": password})),
    )
    .await
}

#[tokio::test]
async fn token_issuance_and_refresh() {
    let (app, _state) = spawn_app().await;

    register(&app, "alice", "Secr3t!pass").await;

    let (status, body) = obtain_pair(&app, "alice", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, body) = obtain_pair(&app, "alice", "Secr3t!pass").await;
    assert_eq!(status, StatusCode::OK);
    let access = body["data"]["access"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh"].as_str().unwrap().to_string();

    let (status, _) = request(&app, "GET", "/accounts/me/", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);

    // Rotate the pair; the new access token must work.
    let (status, body) = request(
        &app,
        "POST",
        "/accounts/token/refresh/",
        None,
        Some(serde_json::json!({"refresh": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["data"]["access"].as_str().unwrap().to_string();

    let (status, _) = request(&app, "GET", "/accounts/me/", Some(&rotated), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let (app, _state) = spawn_app().await;

    register(&app, "alice", "Secr3t!pass").await;
    let (_, body) = obtain_pair(&app, "alice", "Secr3t!pass").await;
    let access = body["data"]["access"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "POST",
        "/accounts/token/refresh/",
        None,
        Some(serde_json::json!({"refresh": access})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // And a refresh token cannot be used as a bearer credential.
    let (status, _) = request(&app, "GET", "/accounts/me/", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_rejects_wrong_old_password() {
    let (app, _state) = spawn_app().await;

    register(&app, "alice", "Secr3t!pass").await;
    let (_, body) = obtain_pair(&app, "alice", "Secr3t!pass").await;
    let access = body["data"]["access"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        "POST",
        "/accounts/change-password/",
        Some(&access),
        Some(serde_json::json!({
            "old_password": "not-the-password",
            "new_password": "N3w!password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Incorrect old password");

    // Stored hash untouched: the original password still authenticates.
    let (status, _) = obtain_pair(&app, "alice", "Secr3t!pass").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn change_password_replaces_credential() {
    let (app, _state) = spawn_app().await;

    register(&app, "alice", "Secr3t!pass").await;
    let (_, body) = obtain_pair(&app, "alice", "Secr3t!pass").await;
    let access = body["data"]["access"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "POST",
        "/accounts/change-password/",
        Some(&access),
        Some(serde_json::json!({
            "old_password": "Secr3t!pass",
            "new_password": "N3w!password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = obtain_pair(&app, "alice", "Secr3t!pass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = obtain_pair(&app, "alice", "N3w!password").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn forgot_password_does_not_reveal_accounts() {
    let (app, _state) = spawn_app().await;

    register(&app, "alice", "Secr3t!pass").await;

    let (hit_status, hit_body) = request(
        &app,
        "POST",
        "/accounts/forgot-password-request/",
        None,
        Some(serde_json::json!({"username": "alice"})),
    )
    .await;
    let (miss_status, miss_body) = request(
        &app,
        "POST",
        "/accounts/forgot-password-request/",
        None,
        Some(serde_json::json!({"username": "nobody"})),
    )
    .await;

    assert_eq!(hit_status, StatusCode::OK);
    assert_eq!(miss_status, hit_status);
    assert_eq!(miss_body, hit_body);
}

#[tokio::test]
async fn reset_password_consumes_the_token() {
    let (app, state) = spawn_app().await;

    register(&app, "alice", "Secr3t!pass").await;
    let user = state
        .store()
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();
    let token = state.store().create_reset_token(user.id).await.unwrap();

    let (status, body) = request(
        &app,
        "POST",
        "/accounts/reset-password/",
        None,
        Some(serde_json::json!({
            "user_id": user.id,
            "token": token,
            "new_password": "R3set!pass"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Password reset successful");

    let (status, _) = obtain_pair(&app, "alice", "R3set!pass").await;
    assert_eq!(status, StatusCode::OK);

    // Single use: the same token is now an unknown token.
    let (status, body) = request(
        &app,
        "POST",
        "/accounts/reset-password/",
        None,
        Some(serde_json::json!({
            "user_id": user.id,
            "token": token,
            "new_password": "Again!pass1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid token or user");
}

#[tokio::test]
async fn reset_password_requires_all_fields() {
    let (app, _state) = spawn_app().await;

    for payload in [
        serde_json::json!({}),
        serde_json::json!({"user_id": 1}),
        serde_json::json!({"user_id": 1, "token": "t"}),
        serde_json::json!({"token": "t", "new_password": "R3set!pass"}),
    ] {
        let (status, body) = request(
            &app,
            "POST",
            "/accounts/reset-password/",
            None,
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing data");
    }
}

#[tokio::test]
async fn reset_password_rejects_unknown_token_or_user() {
    let (app, state) = spawn_app().await;

    register(&app, "alice", "Secr3t!pass").await;
    let user = state
        .store()
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();

    let (status, body) = request(
        &app,
        "POST",
        "/accounts/reset-password/",
        None,
        Some(serde_json::json!({
            "user_id": user.id,
            "token": "ffffffff-ffff-ffff-ffff-ffffffffffff",
            "new_password": "R3set!pass"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid token or user");

    // Unknown user id gets the same indistinguishable error.
    let (status, body) = request(
        &app,
        "POST",
        "/accounts/reset-password/",
        None,
        Some(serde_json::json!({
            "user_id": 9999,
            "token": "ffffffff-ffff-ffff-ffff-ffffffffffff",
            "new_password": "R3set!pass"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid token or user");
}

#[tokio::test]
async fn delete_account_cascades_to_owned_rows() {
    let (app, state) = spawn_app().await;

    register(&app, "alice", "Secr3t!pass").await;
    let user = state
        .store()
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();
    let token = state.store().create_reset_token(user.id).await.unwrap();

    let (_, body) = obtain_pair(&app, "alice", "Secr3t!pass").await;
    let access = body["data"]["access"].as_str().unwrap().to_string();

    let (status, body) = request(&app, "DELETE", "/accounts/delete/", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "User 'alice' deleted successfully.");

    assert!(
        state
            .store()
            .get_user_by_username("alice")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        state
            .store()
            .find_reset_token(user.id, &token)
            .await
            .unwrap()
            .is_none()
    );

    // A still-valid token for a deleted user no longer authenticates.
    let (status, _) = request(&app, "GET", "/accounts/me/", Some(&access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
