#![allow(clippy::unwrap_used, clippy::panic, clippy::todo, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::items_after_statements, unreachable_pub, clippy::similar_names)]
use common::TestApp;
use reqwest::StatusCode;
use serde_json::json;
mod common;

#[tokio::test]
async fn test_openapi_document() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(format!("{}/openapi.yaml", app.server_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/yaml");

    let body = resp.text().await.unwrap();
    assert!(body.contains(&format!("version: {}", env!("CARGO_PKG_VERSION"))));
    assert!(body.contains("/messages/threads"));
}

#[tokio::test]
async fn test_request_id_is_generated_and_propagated() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(format!("{}/openapi.yaml", app.server_url)).send().await.unwrap();
    assert!(resp.headers().get("x-request-id").is_some_and(|v| !v.is_empty()));

    let resp = app
        .client
        .get(format!("{}/openapi.yaml", app.server_url))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited() {
    let mut config = common::get_test_config();
    config.rate_limit.auth_per_second = 1;
    config.rate_limit.auth_burst = 2;
    let app = TestApp::spawn_with_config(config).await;

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let resp = app
            .client
            .post(format!("{}/auth/login", app.server_url))
            .json(&json!({ "email": "nobody@example.com", "password": "password123" }))
            .send()
            .await
            .unwrap();
        statuses.push(resp.status());
    }

    assert_eq!(&statuses[..2], &[StatusCode::UNAUTHORIZED, StatusCode::UNAUTHORIZED]);
    assert!(statuses[2..].contains(&StatusCode::TOO_MANY_REQUESTS));

    // Message routes use the standard tier and are unaffected.
    let resp = app.client.get(format!("{}/messages/threads", app.server_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
