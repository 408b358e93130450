mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::{
    TEST_TOKEN, TestApp, create_test_app, link_config, new_link, seed_link, test_server,
};
use short_url::config::LinkConfig;
use short_url::domain::repositories::ShortLinkRepository;
use serde_json::{Value, json};

fn bearer() -> String {
    format!("Bearer {TEST_TOKEN}")
}

fn app_and_server() -> (TestApp, TestServer) {
    let app = create_test_app(link_config());
    let server = test_server(app.state.clone());
    (app, server)
}

async fn create(server: &TestServer, body: Value) -> axum_test::TestResponse {
    server
        .post("/api/links")
        .add_header("authorization", bearer())
        .json(&body)
        .await
}

// ─── AUTH ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_requires_bearer_token() {
    let (_app, server) = app_and_server();

    let response = server
        .post("/api/links")
        .json(&json!({ "destination_url": "https://example.com" }))
        .await;

    response.assert_status_unauthorized();
    assert_eq!(response.header("www-authenticate"), "Bearer");
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let (_app, server) = app_and_server();

    let response = server
        .get("/api/links/abc12")
        .add_header("authorization", "Bearer not-the-token")
        .await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "unauthorized");
}

// ─── CREATE ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_with_generated_key() {
    let (_app, server) = app_and_server();

    let response = create(&server, json!({ "destination_url": "https://example.com/landing" })).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let key = body["url_key"].as_str().unwrap();
    assert_eq!(key.len(), 5);
    assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(body["short_url"], format!("https://sho.rt/short/{key}"));
    assert_eq!(body["destination_url"], "https://example.com/landing");
    assert_eq!(body["redirect_status_code"], 301);
    assert_eq!(body["track_visits"], true);
    assert_eq!(body["single_use"], false);
    assert!(!body["activated_at"].is_null());
    assert!(body["deactivated_at"].is_null());
    assert!(body.get("visit_count").is_none());
}

#[tokio::test]
async fn test_create_with_custom_key_and_options() {
    let (_app, server) = app_and_server();

    let response = create(
        &server,
        json!({
            "destination_url": "https://example.com/invite",
            "url_key": "invite-42",
            "single_use": true,
            "forward_query_params": true,
            "redirect_status_code": 307,
            "tracking": { "ip_address": false }
        }),
    )
    .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["url_key"], "invite-42");
    assert_eq!(body["short_url"], "https://sho.rt/short/invite-42");
    assert_eq!(body["single_use"], true);
    assert_eq!(body["forward_query_params"], true);
    assert_eq!(body["redirect_status_code"], 307);
    assert_eq!(body["tracking"]["ip_address"], false);
    assert_eq!(body["tracking"]["browser"], true);

    let redirect = server.get("/short/invite-42").await;
    assert_eq!(redirect.status_code(), 307);
    assert_eq!(redirect.header("location"), "https://example.com/invite");
}

#[tokio::test]
async fn test_create_rewrites_http_destination() {
    let (_app, server) = app_and_server();

    let response = create(&server, json!({ "destination_url": "http://example.com/page" })).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["destination_url"], "https://example.com/page");
}

#[tokio::test]
async fn test_create_keeps_http_when_secure_disabled() {
    let (_app, server) = app_and_server();

    let response = create(
        &server,
        json!({ "destination_url": "http://example.com/page", "secure": false }),
    )
    .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["destination_url"], "http://example.com/page");
}

#[tokio::test]
async fn test_create_duplicate_key_rejected() {
    let (app, server) = app_and_server();
    seed_link(&app.links, new_link("taken", "https://example.com")).await;

    let response = create(
        &server,
        json!({ "destination_url": "https://example.com/other", "url_key": "taken" }),
    )
    .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(
        body["error"]["message"],
        "A short link with this key already exists."
    );
}

#[tokio::test]
async fn test_create_rejects_key_outside_charset() {
    let (_app, server) = app_and_server();

    let response = create(
        &server,
        json!({ "destination_url": "https://example.com", "url_key": "no spaces!" }),
    )
    .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_rejects_non_redirect_status() {
    let (_app, server) = app_and_server();

    let response = create(
        &server,
        json!({ "destination_url": "https://example.com", "redirect_status_code": 200 }),
    )
    .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_rejects_inverted_window() {
    let (_app, server) = app_and_server();
    let activate = chrono::Utc::now() + chrono::Duration::days(2);
    let deactivate = chrono::Utc::now() + chrono::Duration::days(1);

    let response = create(
        &server,
        json!({
            "destination_url": "https://example.com",
            "activate_at": activate,
            "deactivate_at": deactivate
        }),
    )
    .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_rejects_invalid_destination() {
    let (_app, server) = app_and_server();

    let empty = create(&server, json!({ "destination_url": "" })).await;
    empty.assert_status_bad_request();

    let malformed = create(&server, json!({ "destination_url": "not a url" })).await;
    malformed.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_rejects_destination_with_control_characters() {
    let (app, server) = app_and_server();

    let response = create(
        &server,
        json!({
            "destination_url": "https://example.com/a\u{1}b",
            "url_key": "ctrl1",
            "single_use": true
        }),
    )
    .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(app.links.find_by_key("ctrl1").await.unwrap().is_none());

    server.get("/short/ctrl1").await.assert_status_not_found();
}

#[tokio::test]
async fn test_create_rejects_destination_without_host() {
    let (_app, server) = app_and_server();

    let response = create(&server, json!({ "destination_url": "https://" })).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_rejects_reserved_key_without_prefix() {
    let app = create_test_app(LinkConfig {
        prefix: None,
        ..link_config()
    });
    let server = test_server(app.state.clone());

    for key in ["health", "api"] {
        let response = create(
            &server,
            json!({ "destination_url": "https://example.com", "url_key": key }),
        )
        .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "This URL key is reserved.");
    }

    assert_eq!(app.links.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_with_seed_is_deterministic() {
    let (_app_a, server_a) = app_and_server();
    let (_app_b, server_b) = app_and_server();
    let body = json!({ "destination_url": "https://example.com", "seed": 42 });

    let first: Value = create(&server_a, body.clone()).await.json();
    let second: Value = create(&server_b, body).await.json();

    assert_eq!(first["url_key"], second["url_key"]);
}

#[tokio::test]
async fn test_create_future_activation_is_pending() {
    let (_app, server) = app_and_server();
    let activate = chrono::Utc::now() + chrono::Duration::days(1);

    let response = create(
        &server,
        json!({
            "destination_url": "https://example.com",
            "url_key": "soon1",
            "activate_at": activate
        }),
    )
    .await;
    response.assert_status(StatusCode::CREATED);

    server.get("/short/soon1").await.assert_status_not_found();
}

// ─── GET ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_link_includes_visit_count() {
    let (app, server) = app_and_server();
    seed_link(&app.links, new_link("abc12", "https://example.com")).await;

    server.get("/short/abc12").await;
    server.get("/short/abc12").await;

    let response = server
        .get("/api/links/abc12")
        .add_header("authorization", bearer())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["url_key"], "abc12");
    assert_eq!(body["visit_count"], 2);
}

#[tokio::test]
async fn test_get_link_not_found() {
    let (_app, server) = app_and_server();

    let response = server
        .get("/api/links/missing")
        .add_header("authorization", bearer())
        .await;

    response.assert_status_not_found();
}

// ─── VISITS ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_visits_paginated() {
    let (app, server) = app_and_server();
    seed_link(&app.links, new_link("abc12", "https://example.com")).await;

    for _ in 0..3 {
        server.get("/short/abc12").add_header("referer", "https://ref.example").await;
    }

    let response = server
        .get("/api/links/abc12/visits")
        .add_query_param("page", 1)
        .add_query_param("page_size", 2)
        .add_header("authorization", bearer())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["url_key"], "abc12");
    assert_eq!(body["pagination"]["total_items"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["referer_url"], "https://ref.example");

    let last_page: Value = server
        .get("/api/links/abc12/visits")
        .add_query_param("page", 2)
        .add_query_param("page_size", 2)
        .add_header("authorization", bearer())
        .await
        .json();
    assert_eq!(last_page["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_visits_invalid_page() {
    let (app, server) = app_and_server();
    seed_link(&app.links, new_link("abc12", "https://example.com")).await;

    let response = server
        .get("/api/links/abc12/visits")
        .add_query_param("page", 0)
        .add_header("authorization", bearer())
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_list_visits_unknown_link() {
    let (_app, server) = app_and_server();

    let response = server
        .get("/api/links/missing/visits")
        .add_header("authorization", bearer())
        .await;

    response.assert_status_not_found();
}
