use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::IncubatorApiState;

pub fn router() -> Router<Arc<IncubatorApiState>> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<Arc<IncubatorApiState>>) -> Json<Value> {
    let engine = state.engine.read().await;
    Json(json!({
        "status": "ok",
        "chain": engine.config().chain,
        "sessions": engine.sessions().count(),
    }))
}
