pub mod auth;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use incubator_runtime::IncubationEngine;

pub struct IncubatorApiState {
    pub engine: RwLock<IncubationEngine>,
    pub api_token: String,
}

impl IncubatorApiState {
    pub fn new(engine: IncubationEngine, api_token: impl Into<String>) -> Self {
        Self {
            engine: RwLock::new(engine),
            api_token: api_token.into(),
        }
    }
}

fn cors_layer() -> CorsLayer {
    let origins = std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default();
    if origins == "*" || origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let parsed: Vec<_> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn build_router(state: Arc<IncubatorApiState>) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::sessions::router())
        .merge(routes::actions::router())
        .merge(routes::tools::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(cors_layer())
        .with_state(state)
}
