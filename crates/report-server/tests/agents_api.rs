//! Agent endpoints and document-store CRUD contract tests

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{auth_token, test_state};
use http_body_util::BodyExt;
use report_server::store::DocumentStore;
use report_tasks::ReportConfig;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn team_config() -> Value {
    json!({
        "agents": [
            {"name": "Researcher", "role": "a researcher"},
            {"name": "Writer", "role": "a writer"}
        ]
    })
}

#[tokio::test]
async fn run_agent_requires_token() {
    let (state, _) = test_state(false, None, ReportConfig::default());
    let (status, body) = send(
        report_server::app(state),
        "POST",
        "/agents/run_agent",
        None,
        Some(json!({"agent_config": team_config(), "user_input": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is missing");
}

#[tokio::test]
async fn run_agent_rejects_bad_token() {
    let (state, _) = test_state(false, None, ReportConfig::default());
    let (status, body) = send(
        report_server::app(state),
        "POST",
        "/agents/run_agent",
        Some("not-a-jwt"),
        Some(json!({"agent_config": team_config(), "user_input": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn run_agent_persists_config_and_records_run() {
    let (state, store) = test_state(false, None, ReportConfig::default());
    let app = report_server::app(state);
    let token = auth_token("user-1");

    let (status, body) = send(
        app,
        "POST",
        "/agents/run_agent",
        Some(&token),
        Some(json!({"agent_config": team_config(), "user_input": "summarize NVDA"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let agent_id = body["agent_id"].as_str().expect("agent_id");
    assert!(!agent_id.is_empty());
    assert_eq!(body["result"]["input"], "summarize NVDA");
    assert_eq!(body["result"]["steps"].as_array().expect("steps").len(), 2);
    assert_eq!(store.run_count().await, 1);
}

#[tokio::test]
async fn run_agent_by_id_uses_stored_config() {
    let (state, store) = test_state(false, None, ReportConfig::default());
    let app = report_server::app(state);
    let token = auth_token("user-1");

    let agent_id = store
        .create_agent("user-1", team_config())
        .await
        .expect("create");

    let (status, body) = send(
        app.clone(),
        "POST",
        "/agents/run_agent_by_id",
        Some(&token),
        Some(json!({"agent_id": agent_id, "user_input": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["output"], "stub insight");

    // unknown agent id
    let (status, body) = send(
        app,
        "POST",
        "/agents/run_agent_by_id",
        Some(&token),
        Some(json!({"agent_id": "missing", "user_input": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "agent_not_found");
}

#[tokio::test]
async fn run_agent_missing_fields_is_bad_request() {
    let (state, _) = test_state(false, None, ReportConfig::default());
    let token = auth_token("user-1");
    let (status, _) = send(
        report_server::app(state),
        "POST",
        "/agents/run_agent",
        Some(&token),
        Some(json!({"user_input": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registry_crud_roundtrip() {
    let (state, store) = test_state(false, None, ReportConfig::default());
    let app = report_server::app(state);
    store.put_user("user-1", json!({"name": "Dana"})).await;

    let (status, body) = send(app.clone(), "GET", "/firestore/get_user?id=user-1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Dana");

    let (status, _) = send(app.clone(), "GET", "/firestore/get_user", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        app.clone(),
        "POST",
        "/firestore/add_agent",
        None,
        Some(json!({"user_id": "user-1", "agent_data": {"name": "team"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let agent_id = body["agent_id"].as_str().expect("agent_id").to_string();

    let (status, body) = send(
        app.clone(),
        "PUT",
        "/firestore/update_agent",
        None,
        Some(json!({"user_id": "user-1", "agent_id": agent_id, "agent_data": {"name": "team-2"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "updated");

    let (status, body) = send(
        app,
        "DELETE",
        "/firestore/delete_agent",
        None,
        Some(json!({"user_id": "user-1", "agent_id": agent_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");
}
