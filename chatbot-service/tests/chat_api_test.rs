mod common;

use common::{spawn_app, test_config, TestApp};
use serde_json::{json, Value};

const SESSION: &str = "x-chat-session";

async fn get(app: &TestApp, path: &str, session: &str) -> reqwest::Response {
    app.client
        .get(app.url(path))
        .header(SESSION, session)
        .send()
        .await
        .expect("Failed to execute request.")
}

async fn send(app: &TestApp, session: &str, content: &str) -> reqwest::Response {
    app.client
        .post(app.url("/api/chat/messages"))
        .header(SESSION, session)
        .json(&json!({ "content": content }))
        .send()
        .await
        .expect("Failed to execute request.")
}

#[tokio::test]
async fn session_header_is_required() {
    let app = spawn_app(test_config()).await;

    let response = app
        .client
        .get(app.url("/api/chat/state"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn new_session_starts_closed_and_empty() {
    let app = spawn_app(test_config()).await;

    let response = get(&app, "/api/chat/state", "tab-1").await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["isOpen"], false);
    assert_eq!(body["isLoading"], false);
    assert_eq!(body["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn send_message_returns_reply_and_state() {
    let app = spawn_app(test_config()).await;

    let response = send(&app, "tab-1", "¿Qué es UPME?").await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "answered");
    let messages = body["state"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "¿Qué es UPME?");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Respuesta simulada para: ¿Qué es UPME?");
    assert_eq!(body["state"]["isLoading"], false);
}

#[tokio::test]
async fn blank_message_is_ignored() {
    let app = spawn_app(test_config()).await;

    let response = send(&app, "tab-1", "   ").await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "ignored");
    assert_eq!(body["state"]["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn oversized_message_is_rejected() {
    let app = spawn_app(test_config()).await;

    let response = send(&app, "tab-1", &"a".repeat(4001)).await;

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let app = spawn_app(test_config()).await;

    send(&app, "tab-1", "hola").await;

    let body: Value = get(&app, "/api/chat/state", "tab-2").await.json().await.unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 0);

    let body: Value = get(&app, "/api/chat/state", "tab-1").await.json().await.unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn toggle_flips_visibility() {
    let app = spawn_app(test_config()).await;

    let body: Value = app
        .client
        .post(app.url("/api/chat/toggle"))
        .header(SESSION, "tab-1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["isOpen"], true);

    let body: Value = get(&app, "/api/chat/state", "tab-1").await.json().await.unwrap();
    assert_eq!(body["isOpen"], true);
}

#[tokio::test]
async fn clear_history_empties_conversation() {
    let app = spawn_app(test_config()).await;
    send(&app, "tab-1", "hola").await;

    let response = app
        .client
        .delete(app.url("/api/chat/messages"))
        .header(SESSION, "tab-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn navigate_updates_context() {
    let app = spawn_app(test_config()).await;

    let body: Value = get(&app, "/api/chat/context", "tab-1").await.json().await.unwrap();
    assert_eq!(body["currentRoute"], "/");

    let response = app
        .client
        .put(app.url("/api/chat/route"))
        .header(SESSION, "tab-1")
        .json(&json!({ "path": "/dimensiones/territorios" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["currentRoute"], "/dimensiones/territorios");
    assert_eq!(body["appInfo"]["name"], "Suria");

    let body: Value = get(&app, "/api/chat/context", "tab-1").await.json().await.unwrap();
    assert_eq!(body["currentRoute"], "/dimensiones/territorios");
}

#[tokio::test]
async fn unknown_route_has_no_datasets() {
    let app = spawn_app(test_config()).await;

    let body: Value = app
        .client
        .put(app.url("/api/chat/route"))
        .header(SESSION, "tab-1")
        .json(&json!({ "path": "/no/existe" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["routeName"], "Unknown");
    assert_eq!(body["availableData"], json!({}));
}

#[tokio::test]
async fn end_session_discards_state() {
    let app = spawn_app(test_config()).await;
    send(&app, "tab-1", "hola").await;

    let response = app
        .client
        .delete(app.url("/api/chat/session"))
        .header(SESSION, "tab-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let body: Value = get(&app, "/api/chat/state", "tab-1").await.json().await.unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 0);
}
