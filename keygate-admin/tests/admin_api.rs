//! Integration tests for the settings API handlers.
//!
//! Uses `tower::ServiceExt::oneshot` to call handlers without binding a real
//! TCP port. Every test gets a fresh in-memory state. The acting identity is
//! injected as a request extension, the way the gate does it.

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use keygate_admin::server::{AdminState, build_admin_router};
use keygate_core::Account;
use keygate_plugins::binder::BOUND_USER_OPTION;
use keygate_plugins::keygen::API_KEY_OPTION;
use keygate_store::{ConfigStore, MemoryDirectory, MemoryStore};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt; // .oneshot()

// ── Helper ────────────────────────────────────────────────────

fn admin() -> Account {
    Account::new(1, "admin").with_role("administrator")
}

fn editor() -> Account {
    Account::new(2, "editor").with_role("editor")
}

fn make_state() -> (Arc<AdminState>, Arc<MemoryStore>, Arc<MemoryDirectory>) {
    let store = Arc::new(MemoryStore::with_options([
        (API_KEY_OPTION, json!("k1")),
        (BOUND_USER_OPTION, json!(1)),
    ]));
    let directory = Arc::new(MemoryDirectory::from_accounts([admin(), editor()]));
    let state = Arc::new(AdminState {
        store: store.clone(),
        directory: directory.clone(),
    });
    (state, store, directory)
}

fn get_req(uri: &str, as_user: Option<Account>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(account) = as_user {
        builder = builder.extension(account);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_put(uri: &str, body: serde_json::Value, as_user: Option<Account>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(account) = as_user {
        builder = builder.extension(account);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Health ────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_public() {
    let (state, _, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(get_req("/health", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
}

// ── Access control ────────────────────────────────────────────

#[tokio::test]
async fn anonymous_gets_401() {
    let (state, _, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(get_req("/keygate/v1/settings", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["code"], "rest_not_logged_in");
}

#[tokio::test]
async fn non_admin_gets_403() {
    let (state, store, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(json_put("/keygate/v1/settings", json!({"api_key": "stolen"}), Some(editor())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["code"], "rest_forbidden");
    assert_eq!(store.get(API_KEY_OPTION), Some(json!("k1")));
}

// ── Settings ──────────────────────────────────────────────────

#[tokio::test]
async fn admin_reads_settings() {
    let (state, _, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(get_req("/keygate/v1/settings", Some(admin())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["api_key"], "k1");
    assert_eq!(json["user"], 1);
}

#[tokio::test]
async fn admin_updates_key_with_sanitizing() {
    let (state, store, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(json_put(
            "/keygate/v1/settings",
            json!({"api_key": "  <b>new-key</b>\n"}),
            Some(admin()),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["api_key"], "new-key");
    assert_eq!(store.get(API_KEY_OPTION), Some(json!("new-key")));
    assert_eq!(store.get(BOUND_USER_OPTION), Some(json!(1)));
}

#[tokio::test]
async fn admin_rebinds_user_from_string() {
    let (state, store, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(json_put("/keygate/v1/settings", json!({"user": "-2"}), Some(admin())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["user"], 2);
    assert_eq!(store.get(BOUND_USER_OPTION), Some(json!(2)));
    assert_eq!(store.get(API_KEY_OPTION), Some(json!("k1")));
}

#[tokio::test]
async fn binding_unknown_user_is_stored() {
    let (state, store, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(json_put("/keygate/v1/settings", json!({"user": 42}), Some(admin())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(store.get(BOUND_USER_OPTION), Some(json!(42)));
}

#[tokio::test]
async fn empty_key_is_rejected() {
    let (state, store, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(json_put("/keygate/v1/settings", json!({"api_key": " <p></p> "}), Some(admin())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "rest_invalid_param");
    assert_eq!(store.get(API_KEY_OPTION), Some(json!("k1")));
}

#[tokio::test]
async fn invalid_user_rejects_whole_update() {
    let (state, store, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(json_put(
            "/keygate/v1/settings",
            json!({"api_key": "k2", "user": "nobody"}),
            Some(admin()),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.get(API_KEY_OPTION), Some(json!("k1")));
    assert_eq!(store.get(BOUND_USER_OPTION), Some(json!(1)));
}

// ── Users ─────────────────────────────────────────────────────

#[tokio::test]
async fn admin_lists_user_choices() {
    let (state, _, _) = make_state();
    let resp = build_admin_router(state)
        .oneshot(get_req("/keygate/v1/users", Some(admin())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["total"], 2);
    let users = json["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["id"], 1);
    assert_eq!(users[0]["display_name"], "admin");
}

#[tokio::test]
async fn large_directory_returns_total_only() {
    let (state, _, directory) = make_state();
    for id in 10..120 {
        directory.insert(Account::new(id, format!("user{id}")));
    }
    let resp = build_admin_router(state)
        .oneshot(get_req("/keygate/v1/users", Some(admin())))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["total"], 112);
    assert!(json["users"].is_null());
}
