use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use design_sync::SyncConfig;
use design_sync::error::SyncError;
use design_sync::state::AppState;
use design_sync::webhook::WebhookProcessor;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha1::Sha1;

fn test_config(root: &Path) -> SyncConfig {
    SyncConfig {
        registry_base_url: String::new(),
        registry_space_id: String::new(),
        registry_management_token: String::new(),
        registry_preview_token: String::new(),
        webhook_secret: None,
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

fn processor(config: SyncConfig) -> WebhookProcessor {
    WebhookProcessor::new(Arc::new(AppState::new(config)))
}

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    let mut out = String::new();
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

fn component_event(action: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": action,
        "component": {
            "name": "cta_button",
            "schema": {
                "label": { "type": "text", "required": true },
                "url": { "type": "multilink" }
            }
        }
    }))
    .expect("serialize event")
}

#[tokio::test]
async fn wrong_signature_is_rejected_before_any_file_is_touched() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(workspace.path());
    config.webhook_secret = Some("topsecret".to_string());
    let components_dir = config.components_dir.clone();

    let body = component_event("component.created");
    let err = processor(config)
        .handle(&body, Some("0000000000000000000000000000000000000000"))
        .await
        .expect_err("bad signature");

    assert!(matches!(err, SyncError::SignatureInvalid));
    assert!(!components_dir.exists(), "no artifact may be written");
}

#[tokio::test]
async fn valid_signature_regenerates_the_artifact_set() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(workspace.path());
    config.webhook_secret = Some("topsecret".to_string());
    let stub_path = config.stub_path("CtaButton");
    let story_path = config.story_path("CtaButton");

    let body = component_event("component.created");
    let signature = sign("topsecret", &body);
    let ack = processor(config)
        .handle(&body, Some(&signature))
        .await
        .expect("processed");

    assert!(ack.success);
    assert!(stub_path.exists());
    assert!(story_path.exists());
}

#[tokio::test]
async fn redelivery_is_idempotent() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let config = test_config(workspace.path());
    let stub_path = config.stub_path("CtaButton");
    let processor = processor(config);

    let body = component_event("component.updated");
    processor.handle(&body, None).await.expect("first delivery");
    let first = std::fs::read_to_string(&stub_path).expect("stub written");

    processor.handle(&body, None).await.expect("second delivery");
    let second = std::fs::read_to_string(&stub_path).expect("stub still there");

    assert_eq!(first, second);
}

#[tokio::test]
async fn deleting_a_never_generated_component_is_a_no_op_success() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let config = test_config(workspace.path());

    let body = component_event("component.deleted");
    let ack = processor(config).handle(&body, None).await.expect("ack");
    assert!(ack.success);
}

#[tokio::test]
async fn delete_after_create_removes_the_paired_files() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let config = test_config(workspace.path());
    let stub_path = config.stub_path("CtaButton");
    let type_path = config.type_path("CtaButton");
    let processor = processor(config);

    processor
        .handle(&component_event("component.created"), None)
        .await
        .expect("create");
    assert!(stub_path.exists());

    processor
        .handle(&component_event("component.deleted"), None)
        .await
        .expect("delete");
    assert!(!stub_path.exists());
    assert!(!type_path.exists());

    // Redelivered deletion still succeeds.
    processor
        .handle(&component_event("component.deleted"), None)
        .await
        .expect("redelivered delete");
}

#[tokio::test]
async fn unhandled_events_are_acknowledged_and_ignored() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let config = test_config(workspace.path());

    let body = serde_json::to_vec(&json!({ "action": "release.merged" })).unwrap();
    let ack = processor(config).handle(&body, None).await.expect("ack");
    assert!(ack.success);
    assert_eq!(ack.message, "event ignored");
}

#[tokio::test]
async fn story_deletion_cleans_up_a_matching_preview() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let config = test_config(workspace.path());
    let preview = config.story_path("LegacyPromo");
    std::fs::create_dir_all(preview.parent().unwrap()).expect("stories dir");
    std::fs::write(&preview, "export default {};").expect("write preview");

    let body = serde_json::to_vec(&json!({
        "action": "story.deleted",
        "story": { "slug": "legacy_promo", "content_type": "page" }
    }))
    .unwrap();

    let ack = processor(config).handle(&body, None).await.expect("ack");
    assert!(ack.success);
    assert!(!preview.exists());
}

#[tokio::test]
async fn malformed_payload_is_an_error_after_signature_passes() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let config = test_config(workspace.path());

    let err = processor(config)
        .handle(b"not json", None)
        .await
        .expect_err("invalid payload");
    assert!(matches!(err, SyncError::InvalidPayload(_)));
}
