use std::sync::Arc;

use alloy::primitives::Address;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use incubator_runtime::builders::identity::ProjectManifest;
use incubator_runtime::{ActionType, ConversationStep, Response, SessionView, Stage};

use super::{ApiResult, api_error};
use crate::IncubatorApiState;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub project_name: String,
    pub founder: Address,
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub response: Response,
}

#[derive(Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub project_name: String,
    pub stage: Stage,
    pub step: ConversationStep,
    pub completed: usize,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct NextActionResponse {
    pub next_action: Option<ActionType>,
}

pub fn router() -> Router<Arc<IncubatorApiState>> {
    Router::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/messages", post(send_message))
        .route("/sessions/{id}/reset", post(reset_session))
        .route("/sessions/{id}/next-action", get(next_action))
        .route("/sessions/{id}/manifest", get(manifest))
}

async fn create_session(
    State(state): State<Arc<IncubatorApiState>>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    if request.project_name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "project_name is required".into()));
    }
    let mut engine = state.engine.write().await;
    let (session_id, response) = engine.create_session(&request.project_name, request.founder);
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            response,
        }),
    ))
}

async fn list_sessions(State(state): State<Arc<IncubatorApiState>>) -> Json<Vec<SessionSummary>> {
    let engine = state.engine.read().await;
    let mut sessions: Vec<_> = engine.sessions().collect();
    sessions.sort_by_key(|s| s.created_at);
    Json(
        sessions
            .into_iter()
            .map(|s| SessionSummary {
                id: s.id,
                project_name: s.project_name.clone(),
                stage: s.stage(),
                step: s.step(),
                completed: s.completed_count(),
            })
            .collect(),
    )
}

async fn get_session(
    State(state): State<Arc<IncubatorApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let engine = state.engine.read().await;
    let session = engine.session(id).map_err(api_error)?;
    Ok(Json(session.view()))
}

async fn send_message(
    State(state): State<Arc<IncubatorApiState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<Json<Response>> {
    // The availability lookup is an RPC round trip; other sessions must not
    // wait on it.
    let check = {
        let engine = state.engine.read().await;
        engine.identity_check(id, &request.text).map_err(api_error)?
    };
    let verdict = match check {
        Some(check) => Some(check.run().await),
        None => None,
    };
    let mut engine = state.engine.write().await;
    engine
        .apply_message(id, &request.text, verdict)
        .map(Json)
        .map_err(api_error)
}

async fn reset_session(
    State(state): State<Arc<IncubatorApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Response>> {
    let mut engine = state.engine.write().await;
    engine.reset(id).map(Json).map_err(api_error)
}

async fn next_action(
    State(state): State<Arc<IncubatorApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NextActionResponse>> {
    let engine = state.engine.read().await;
    let next_action = engine.next_action(id).map_err(api_error)?;
    Ok(Json(NextActionResponse { next_action }))
}

async fn manifest(
    State(state): State<Arc<IncubatorApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectManifest>> {
    let engine = state.engine.read().await;
    let session = engine.session(id).map_err(api_error)?;
    Ok(Json(session.manifest()))
}
