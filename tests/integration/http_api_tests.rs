//! Integration tests for the visitor-facing HTTP endpoints.
//!
//! Runs the real axum server on an ephemeral port with no Slack
//! service attached, exercising the degraded-mode and store-backed
//! paths end to end over `reqwest`.

use std::time::Duration;

use serde_json::Value;

use visit_intercom::models::command::CommandSlot;

use super::test_helpers::spawn_server;

const TTL: Duration = Duration::from_secs(300);

// ── GET /health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let (base_url, _store, ct) = spawn_server("http://127.0.0.1:1").await;

    let resp = reqwest::get(format!("{base_url}/health"))
        .await
        .expect("GET /health");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "ok");

    ct.cancel();
}

// ── GET /check-command ───────────────────────────────────────────────

#[tokio::test]
async fn check_command_empty_reports_null() {
    let (base_url, _store, ct) = spawn_server("http://127.0.0.1:1").await;

    let body: Value = reqwest::get(format!("{base_url}/check-command"))
        .await
        .expect("GET")
        .json()
        .await
        .expect("json");
    assert_eq!(body["command"], Value::Null);

    ct.cancel();
}

#[tokio::test]
async fn check_command_drains_pending_slot() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;

    let slot = CommandSlot::with_payload("REQUEST_CALLBACK_NUMBER", "", "123456");
    store.put_command(&slot, TTL).await.expect("put");

    let body: Value = reqwest::get(format!("{base_url}/check-command"))
        .await
        .expect("GET")
        .json()
        .await
        .expect("json");
    assert_eq!(body["command"], "REQUEST_CALLBACK_NUMBER");
    assert_eq!(body["payload"], "123456");
    assert!(body["timestamp"].is_string());

    // Read-once: the next poll sees nothing.
    let body: Value = reqwest::get(format!("{base_url}/check-command"))
        .await
        .expect("GET")
        .json()
        .await
        .expect("json");
    assert_eq!(body["command"], Value::Null);

    ct.cancel();
}

#[tokio::test]
async fn check_command_omits_absent_payload() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;

    store
        .put_command(&CommandSlot::new("SHOW_GREETING", "hello"), TTL)
        .await
        .expect("put");

    let body: Value = reqwest::get(format!("{base_url}/check-command"))
        .await
        .expect("GET")
        .json()
        .await
        .expect("json");
    assert_eq!(body["command"], "SHOW_GREETING");
    assert_eq!(body["message"], "hello");
    assert!(body.get("payload").is_none());

    ct.cancel();
}

// ── POST /notify ─────────────────────────────────────────────────────

#[tokio::test]
async fn notify_short_circuits_when_unavailable() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;

    store.set_availability(false).await.expect("set");

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base_url}/notify"))
        .send()
        .await
        .expect("POST /notify");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["available"], false);

    ct.cancel();
}

#[tokio::test]
async fn notify_without_slack_reports_degraded() {
    // Slack is not configured in the test harness; an available
    // service must still answer rather than crash, with an error
    // status the caller can observe.
    let (base_url, _store, ct) = spawn_server("http://127.0.0.1:1").await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base_url}/notify"))
        .send()
        .await
        .expect("POST /notify");
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["status"], "error");

    ct.cancel();
}

#[tokio::test]
async fn notify_recovers_after_availability_restored() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    store.set_availability(false).await.expect("off");
    let body: Value = client
        .post(format!("{base_url}/notify"))
        .send()
        .await
        .expect("POST")
        .json()
        .await
        .expect("json");
    assert_eq!(body["available"], false);

    store.set_availability(true).await.expect("on");
    let resp = client
        .post(format!("{base_url}/notify"))
        .send()
        .await
        .expect("POST");
    // Back on the publish path (degraded only because the harness has
    // no Slack service).
    assert_eq!(resp.status(), 503);

    ct.cancel();
}

// ── POST /send-message ───────────────────────────────────────────────

#[tokio::test]
async fn send_message_without_field_is_client_error() {
    let (base_url, _store, ct) = spawn_server("http://127.0.0.1:1").await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base_url}/send-message"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "No message provided");

    ct.cancel();
}

#[tokio::test]
async fn send_message_empty_string_is_client_error() {
    let (base_url, _store, ct) = spawn_server("http://127.0.0.1:1").await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base_url}/send-message"))
        .json(&serde_json::json!({"message": ""}))
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), 400);

    ct.cancel();
}

// ── POST /track-ip ───────────────────────────────────────────────────

#[tokio::test]
async fn track_ip_is_a_noop_success() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base_url}/track-ip"))
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["status"], "success");

    // Nothing was written anywhere.
    assert!(store.take_command().await.expect("take").is_none());

    ct.cancel();
}
