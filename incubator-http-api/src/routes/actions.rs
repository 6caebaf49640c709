//! Wallet callbacks for an action's prepared transactions.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use serde::Deserialize;
use uuid::Uuid;

use incubator_runtime::{Action, Response};

use super::{ApiResult, api_error};
use crate::IncubatorApiState;

#[derive(Deserialize)]
pub struct SubmittedRequest {
    pub tx_hash: String,
}

#[derive(Deserialize, Default)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub tx_hash: Option<String>,
}

#[derive(Deserialize)]
pub struct FailRequest {
    pub error: String,
}

pub fn router() -> Router<Arc<IncubatorApiState>> {
    Router::new()
        .route("/sessions/{id}/actions/{action_id}/submitted", post(submitted))
        .route("/sessions/{id}/actions/{action_id}/confirm", post(confirm))
        .route("/sessions/{id}/actions/{action_id}/fail", post(fail))
}

async fn submitted(
    State(state): State<Arc<IncubatorApiState>>,
    Path((id, action_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SubmittedRequest>,
) -> ApiResult<Json<Action>> {
    let mut engine = state.engine.write().await;
    engine
        .mark_submitted(id, action_id, request.tx_hash)
        .map(Json)
        .map_err(api_error)
}

async fn confirm(
    State(state): State<Arc<IncubatorApiState>>,
    Path((id, action_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ConfirmRequest>,
) -> ApiResult<Json<Response>> {
    let mut engine = state.engine.write().await;
    engine
        .confirm_action(id, action_id, request.tx_hash)
        .map(Json)
        .map_err(api_error)
}

async fn fail(
    State(state): State<Arc<IncubatorApiState>>,
    Path((id, action_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<FailRequest>,
) -> ApiResult<Json<Response>> {
    let mut engine = state.engine.write().await;
    engine
        .fail_action(id, action_id, request.error)
        .map(Json)
        .map_err(api_error)
}
