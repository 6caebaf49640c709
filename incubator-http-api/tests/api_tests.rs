//! Integration tests for the incubation HTTP API.
//!
//! Drives the real axum router in-process with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http_body_util::BodyExt;
use hyper::Request;
use serde_json::{Value, json};
use tokio::sync::Notify;
use tower::ServiceExt;

use incubator_http_api::{IncubatorApiState, build_router};
use incubator_runtime::collaborators::IdentityResolver;
use incubator_runtime::{Deployment, IncubationEngine, IncubatorConfig, IncubatorError};

const TEST_TOKEN: &str = "test-api-token-12345";
const FOUNDER: &str = "0x00000000000000000000000000000000000000f0";

fn test_config() -> IncubatorConfig {
    IncubatorConfig {
        deployment: Deployment {
            hub_dao: Some("0x00000000000000000000000000000000000000a1".parse().unwrap()),
            buyback: Some("0x00000000000000000000000000000000000000b1".parse().unwrap()),
            channel_custody: Some("0x00000000000000000000000000000000000000a2".parse().unwrap()),
            project_token: Some("0xffffffffffffffffffffffffffffffffffffff01".parse().unwrap()),
            anti_rug_hook: Some("0x00000000000000000000000000000000000000a4".parse().unwrap()),
            ..Deployment::default()
        },
        ..IncubatorConfig::default()
    }
}

fn test_app() -> Router {
    let state = Arc::new(IncubatorApiState::new(
        IncubationEngine::new(test_config()),
        TEST_TOKEN,
    ));
    build_router(state)
}

fn auth_header() -> String {
    format!("Bearer {TEST_TOKEN}")
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (u16, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", auth_header())
        .header("content-type", "application/json");
    let body = match body {
        Some(v) => Body::from(serde_json::to_vec(&v).unwrap()),
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn create_session(app: &Router) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/sessions",
        Some(json!({ "project_name": "DeFi Hub", "founder": FOUNDER })),
    )
    .await;
    assert_eq!(status, 201);
    json["session_id"].as_str().unwrap().to_string()
}

async fn message(app: &Router, id: &str, text: &str) -> Value {
    let (status, json) = send(
        app,
        "POST",
        &format!("/sessions/{id}/messages"),
        Some(json!({ "text": text })),
    )
    .await;
    assert_eq!(status, 200);
    json
}

#[tokio::test]
async fn test_health_no_auth_required() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["chain"], "base_sepolia");
}

#[tokio::test]
async fn test_auth_required_for_routes() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/tools")
                .header("authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_list_tools() {
    let app = test_app();
    let (status, json) = send(&app, "GET", "/tools", None).await;
    assert_eq!(status, 200);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"transfer_usdc"));
    assert!(names.contains(&"buyback_with_approval"));
}

#[tokio::test]
async fn test_invoke_tool() {
    let app = test_app();
    let (status, json) = send(
        &app,
        "POST",
        "/tools/buyback_with_approval",
        Some(json!({ "usdc_amount": "$5,000", "min_out": "400000" })),
    )
    .await;
    assert_eq!(status, 200);
    let txs = json.as_array().unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(
        txs[1]["to"].as_str().unwrap().to_lowercase(),
        "0x00000000000000000000000000000000000000b1"
    );
    assert_eq!(txs[0]["chain_id"], 84532);

    let (status, _) = send(&app, "POST", "/tools/launch_rocket", Some(json!({}))).await;
    assert_eq!(status, 404);

    let (status, body) = send(
        &app,
        "POST",
        "/tools/initialize_pool",
        Some(json!({
            "token_a": "0x00000000000000000000000000000000000000c1",
            "token_b": "0x00000000000000000000000000000000000000c2",
            "fee": 100,
            "initial_price": 1.0
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_conversation_over_http() {
    let app = test_app();
    let id = create_session(&app).await;

    message(&app, &id, "defi-hub").await;
    let rejected = message(&app, &id, "$500").await;
    assert!(rejected["message"].as_str().unwrap().contains("out of range"));
    assert!(rejected.get("patch").is_none());

    message(&app, &id, "$10,000").await;
    message(&app, &id, "12 months").await;
    let confirmed = message(&app, &id, "confirm").await;
    assert_eq!(confirmed["patch"]["step"], "incubating");
    assert_eq!(confirmed["patch"]["stage"], "screening");

    let (status, view) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(status, 200);
    assert_eq!(view["step"], "incubating");
    assert_eq!(view["next_action"], "mint_identity");
    assert_eq!(view["configuration"]["vesting_months"], 12);
}

#[tokio::test]
async fn test_action_lifecycle_over_http() {
    let app = test_app();
    let id = create_session(&app).await;
    for text in ["defi-hub", "$10,000", "12 months", "confirm"] {
        message(&app, &id, text).await;
    }

    let dispatched = message(&app, &id, "continue").await;
    let action_id = dispatched["action"]["id"].as_str().unwrap().to_string();
    assert_eq!(dispatched["action"]["type"], "mint_identity");
    assert_eq!(dispatched["transactions"].as_array().unwrap().len(), 1);

    let (status, action) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/actions/{action_id}/submitted"),
        Some(json!({ "tx_hash": "0xabc" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(action["status"], "executing");

    let confirm_uri = format!("/sessions/{id}/actions/{action_id}/confirm");
    let (status, confirmed) = send(&app, "POST", &confirm_uri, Some(json!({}))).await;
    assert_eq!(status, 200);
    assert_eq!(confirmed["action"]["status"], "completed");
    assert_eq!(confirmed["patch"]["identity_name"], "defi-hub.consul.eth");

    // terminal actions are frozen
    let (status, _) = send(&app, "POST", &confirm_uri, Some(json!({}))).await;
    assert_eq!(status, 409);

    let (status, next) = send(&app, "GET", &format!("/sessions/{id}/next-action"), None).await;
    assert_eq!(status, 200);
    assert_eq!(next["next_action"], "setup_treasury");

    let dispatched = message(&app, &id, "continue").await;
    let action_id = dispatched["action"]["id"].as_str().unwrap().to_string();
    let (status, failed) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/actions/{action_id}/fail"),
        Some(json!({ "error": "user rejected" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(failed["action"]["status"], "failed");

    let (_, next) = send(&app, "GET", &format!("/sessions/{id}/next-action"), None).await;
    assert_eq!(next["next_action"], "setup_treasury");
}

#[tokio::test]
async fn test_reset_and_manifest() {
    let app = test_app();
    let id = create_session(&app).await;
    for text in ["defi-hub", "$10,000", "12 months", "confirm", "continue"] {
        message(&app, &id, text).await;
    }

    let (status, reset) = send(&app, "POST", &format!("/sessions/{id}/reset"), None).await;
    assert_eq!(status, 200);
    assert!(reset["message"].as_str().unwrap().starts_with("Cancelled 1"));

    let (status, manifest) = send(&app, "GET", &format!("/sessions/{id}/manifest"), None).await;
    assert_eq!(status, 200);
    assert_eq!(manifest["name"], "DeFi Hub");
    assert_eq!(manifest["description"], "DeFi Hub - Incubated by ConsulDAO");
    assert_eq!(manifest["stage"], "screening");
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = test_app();
    let uri = format!("/sessions/{}", uuid_like());
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, 404);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{uri}/messages"),
        Some(json!({ "text": "hi" })),
    )
    .await;
    assert_eq!(status, 404);
}

/// Holds every availability lookup until released.
#[derive(Default)]
struct GatedResolver {
    started: Notify,
    release: Notify,
}

#[async_trait]
impl IdentityResolver for GatedResolver {
    async fn is_available(&self, _name: &str) -> Result<bool, IncubatorError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(true)
    }
}

#[tokio::test]
async fn test_identity_lookup_does_not_block_other_sessions() {
    let resolver = Arc::new(GatedResolver::default());
    let engine = IncubationEngine::new(test_config()).with_resolver(resolver.clone());
    let app = build_router(Arc::new(IncubatorApiState::new(engine, TEST_TOKEN)));
    let a = create_session(&app).await;
    let b = create_session(&app).await;

    let pending = {
        let app = app.clone();
        let a = a.clone();
        tokio::spawn(async move { message(&app, &a, "defi-hub").await })
    };
    resolver.started.notified().await;

    let reset = tokio::time::timeout(
        Duration::from_secs(1),
        send(&app, "POST", &format!("/sessions/{b}/reset"), None),
    )
    .await
    .expect("reset waited on another session's identity lookup");
    assert_eq!(reset.0, 200);

    let (status, view) = tokio::time::timeout(
        Duration::from_secs(1),
        send(&app, "GET", &format!("/sessions/{a}"), None),
    )
    .await
    .expect("session read waited on the identity lookup");
    assert_eq!(status, 200);
    assert_eq!(view["step"], "ask_identity_name");

    resolver.release.notify_one();
    let accepted = pending.await.unwrap();
    assert_eq!(accepted["patch"]["step"], "ask_treasury_amount");
}

fn uuid_like() -> &'static str {
    "00000000-0000-4000-8000-000000000000"
}
