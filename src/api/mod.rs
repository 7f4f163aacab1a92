use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::mailer::Mailer;

mod accounts;
mod admin;
pub mod auth;
mod chances;
mod error;
mod tasks;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub mailer: Mailer,
}

impl AppState {
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let mailer = Mailer::from_config(&config.email)?;

    Ok(Arc::new(AppState {
        config,
        store,
        mailer,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let open_routes = Router::new()
        .route("/accounts/user/register/", post(accounts::register))
        .route("/accounts/token/", post(auth::obtain_token))
        .route("/accounts/token/refresh/", post(auth::refresh_token))
        .route(
            "/accounts/forgot-password-request/",
            post(accounts::forgot_password),
        )
        .route("/accounts/reset-password/", post(accounts::reset_password))
        .route("/accounts/ranked-users/", get(accounts::ranked_users))
        .route("/accounts/tasks/", get(tasks::list_tasks))
        .route("/accounts/chances/", get(chances::list_chances))
        .route("/tasks/", get(tasks::list_tasks))
        .route("/tasks/{id}/", get(tasks::get_task))
        .route("/chances/", get(chances::list_chances))
        .route("/chances/{id}/", get(chances::get_chance));

    let bearer_routes = Router::new()
        .route(
            "/accounts/me/",
            get(accounts::get_me).patch(accounts::patch_me),
        )
        .route(
            "/accounts/change-password/",
            post(accounts::change_password),
        )
        .route("/accounts/delete/", delete(accounts::delete_account))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // Staff routes run the bearer check first (outer layer), then the
    // staff gate.
    let staff_routes = Router::new()
        .route("/tasks/", post(tasks::create_task))
        .route(
            "/tasks/{id}/",
            put(tasks::update_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/chances/", post(chances::create_chance))
        .route(
            "/chances/{id}/",
            put(chances::update_chance)
                .patch(chances::update_chance)
                .delete(chances::delete_chance),
        )
        .route(
            "/admin/users/",
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/admin/users/{id}/",
            get(admin::get_user)
                .put(admin::update_user)
                .patch(admin::update_user)
                .delete(admin::delete_user),
        )
        .route_layer(middleware::from_fn(auth::require_staff))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(open_routes)
        .merge(bearer_routes)
        .merge(staff_routes)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
