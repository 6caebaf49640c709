use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::Value;

use incubator_runtime::ToolOutput;
use incubator_runtime::registry::{self, ToolInfo};

use super::{ApiResult, api_error};
use crate::IncubatorApiState;

pub fn router() -> Router<Arc<IncubatorApiState>> {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(invoke))
}

async fn list_tools() -> Json<Vec<ToolInfo>> {
    Json(registry::list_tools())
}

/// Build the prepared transaction(s) for one tool. Nothing is signed.
async fn invoke(
    State(state): State<Arc<IncubatorApiState>>,
    Path(name): Path<String>,
    Json(intent): Json<Value>,
) -> ApiResult<Json<ToolOutput>> {
    let engine = state.engine.read().await;
    registry::invoke(&name, &intent, engine.config())
        .map(Json)
        .map_err(api_error)
}
