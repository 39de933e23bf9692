use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use design_sync::state::AppState;
use design_sync::{SyncConfig, build_router};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

fn test_config(root: &Path) -> SyncConfig {
    SyncConfig {
        registry_base_url: String::new(),
        registry_space_id: String::new(),
        registry_management_token: String::new(),
        registry_preview_token: String::new(),
        webhook_secret: Some("topsecret".to_string()),
        design_tool_base_url: String::new(),
        design_tool_token: String::new(),
        design_tool_file_key: String::new(),
        build_hook_url: None,
        publish_command: None,
        components_dir: root.join("components"),
        stories_dir: root.join("stories"),
        generated_dir: root.join("generated"),
        tokens_file: root.join("tokens.json"),
        stub_extension: "astro".to_string(),
        auto_create_stories: true,
        auto_deploy: false,
        pacing: Duration::from_millis(0),
        request_timeout: Duration::from_secs(5),
        http_bind_address: "127.0.0.1:0".parse().unwrap(),
    }
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let router = build_router(Arc::new(AppState::new(test_config(workspace.path()))));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn webhook_without_valid_signature_gets_401() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let router = build_router(Arc::new(AppState::new(test_config(workspace.path()))));

    let payload = serde_json::to_vec(&json!({ "action": "component.created" })).unwrap();
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/registry")
                .header("content-type", "application/json")
                .header("webhook-signature", "deadbeef")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unsigned_webhook_is_processed_when_no_secret_is_configured() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(workspace.path());
    config.webhook_secret = None;
    let router = build_router(Arc::new(AppState::new(config)));

    let payload = serde_json::to_vec(&json!({ "action": "release.merged" })).unwrap();
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/registry")
                .header("content-type", "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
}
