use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::auth_service::AuthService;
use crate::services::auth_service_impl::SeaOrmAuthService;
use crate::services::tag_service::TagService;
use crate::services::tag_service_impl::SeaOrmTagService;
use crate::services::token::TokenService;

pub mod auth;
mod error;
pub mod tags;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub tokens: Arc<TokenService>,
    pub auth: Arc<dyn AuthService>,
    pub tags: Arc<dyn TagService>,
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let tokens = Arc::new(TokenService::new(store.clone(), config.auth.clone()));

    let auth: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        tokens.clone(),
        config.security.clone(),
    ));

    let tags: Arc<dyn TagService> = Arc::new(SeaOrmTagService::new(store.clone()));

    Ok(Arc::new(AppState {
        config,
        store,
        tokens,
        auth,
        tags,
    }))
}

#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    // route_layer wraps outside-in, so adding the role check before the
    // bearer check makes the bearer check run first.
    let admin_routes = Router::new()
        .route(
            "/tags",
            get(tags::index).post(tags::store).delete(tags::destroy_batch),
        )
        .route(
            "/tags/{id}",
            get(tags::show).put(tags::update).delete(tags::destroy),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let account_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/sign-out", post(auth::sign_out))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let api_router = Router::new()
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .merge(account_routes)
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::api_key_middleware,
        ))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api/v1", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
