//! End-to-end hand-off tests: operator actions through the listener,
//! pickup through the polling endpoint.
//!
//! The listener and the HTTP server share one store, exactly as the
//! Socket Mode task and request workers do in production.

use std::time::Duration;

use serde_json::Value;

use visit_intercom::catalog::CommandCatalog;
use visit_intercom::slack::listener::ControlListener;

use super::test_helpers::spawn_server;

const TTL: Duration = Duration::from_secs(300);

async fn poll(base_url: &str) -> Value {
    reqwest::get(format!("{base_url}/check-command"))
        .await
        .expect("GET /check-command")
        .json()
        .await
        .expect("json")
}

#[tokio::test]
async fn button_press_reaches_the_poller_once() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;
    let listener = ControlListener::new(store, CommandCatalog::new(), TTL);

    listener.handle_button("SHOW_GREETING").await.expect("button");

    let body = poll(&base_url).await;
    assert_eq!(body["command"], "SHOW_GREETING");
    assert_eq!(body["message"], "An agent has joined your session");

    let body = poll(&base_url).await;
    assert_eq!(body["command"], Value::Null);

    ct.cancel();
}

#[tokio::test]
async fn newer_button_press_supersedes_unread_one() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;
    let listener = ControlListener::new(store, CommandCatalog::new(), TTL);

    listener.handle_button("SHOW_HOLD").await.expect("first");
    listener.handle_button("END_SESSION").await.expect("second");

    let body = poll(&base_url).await;
    assert_eq!(body["command"], "END_SESSION");

    let body = poll(&base_url).await;
    assert_eq!(body["command"], Value::Null);

    ct.cancel();
}

#[tokio::test]
async fn callback_capture_flow_delivers_payload() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;
    let listener = ControlListener::new(store, CommandCatalog::new(), TTL);

    listener
        .handle_button("REQUEST_CALLBACK_NUMBER")
        .await
        .expect("start capture");

    // Nothing is pending until the operator supplies the number.
    let body = poll(&base_url).await;
    assert_eq!(body["command"], Value::Null);

    // A typo first, then the real number.
    listener.handle_text("five five five").await.expect("typo");
    let body = poll(&base_url).await;
    assert_eq!(body["command"], Value::Null);

    listener.handle_text("5551234").await.expect("number");
    let body = poll(&base_url).await;
    assert_eq!(body["command"], "REQUEST_CALLBACK_NUMBER");
    assert_eq!(body["payload"], "5551234");

    ct.cancel();
}

#[tokio::test]
async fn free_text_without_capture_never_surfaces() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;
    let listener = ControlListener::new(store, CommandCatalog::new(), TTL);

    listener.handle_text("5551234").await.expect("idle text");

    let body = poll(&base_url).await;
    assert_eq!(body["command"], Value::Null);

    ct.cancel();
}

#[tokio::test]
async fn toggle_gates_the_notify_endpoint() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;
    let listener = ControlListener::new(store, CommandCatalog::new(), TTL);
    let client = reqwest::Client::new();

    listener
        .handle_button("TOGGLE_AVAILABILITY")
        .await
        .expect("toggle off");

    let body: Value = client
        .post(format!("{base_url}/notify"))
        .send()
        .await
        .expect("POST /notify")
        .json()
        .await
        .expect("json");
    assert_eq!(body["available"], false);

    ct.cancel();
}

#[tokio::test]
async fn expired_command_never_reaches_the_poller() {
    let (base_url, store, ct) = spawn_server("http://127.0.0.1:1").await;
    let listener = ControlListener::new(store, CommandCatalog::new(), Duration::from_millis(50));

    listener.handle_button("SHOW_FAQ").await.expect("button");
    tokio::time::sleep(Duration::from_millis(120)).await;

    let body = poll(&base_url).await;
    assert_eq!(body["command"], Value::Null);

    ct.cancel();
}
