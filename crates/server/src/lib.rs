use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;

use db::repository::Repositories;
use services::tokens::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<Repositories>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: &config::Config, repos: Repositories) -> Self {
        Self {
            repos: Arc::new(repos),
            tokens: TokenService::from_config(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    // Build protected routes (require authentication)
    let protected_routes = Router::new()
        .merge(routes::users::router())
        .merge(routes::projects::router())
        .merge(routes::lists::router())
        .merge(routes::tasks::router())
        .merge(routes::comments::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Build API router
    let api_router = Router::new()
        .nest("/auth", routes::auth::router())
        .merge(protected_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> &'static str {
    "OK"
}
