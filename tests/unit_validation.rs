use std::fs;
use std::path::Path;
use std::time::Duration;

use design_sync::SyncConfig;
use design_sync::error::SyncError;
use design_sync::generator;
use design_sync::model::{TokenMap, ValidationResult};
use design_sync::validate::{
    ValidationEngine, check_stub, get_issues, is_valid_color, is_valid_spacing, validate_tokens,
};
use serde_json::json;

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

#[test]
fn color_validation_accepts_six_hex_with_optional_alpha() {
    assert!(is_valid_color("#1a2b3c"));
    assert!(is_valid_color("#1A2B3C"));
    assert!(is_valid_color("#1a2b3c80"));
    assert!(!is_valid_color("#ZZZZZZ"));
    assert!(!is_valid_color("#fff"));
    assert!(!is_valid_color("rgb(0,0,0)"));
}

#[test]
fn spacing_validation_requires_a_unit() {
    assert!(is_valid_spacing("16px"));
    assert!(is_valid_spacing("0.5rem"));
    assert!(!is_valid_spacing("16"));
    assert!(!is_valid_spacing("auto"));
}

#[test]
fn token_validation_reports_per_value_issues() {
    let mut tokens = TokenMap::default();
    tokens
        .colors
        .insert("good".to_string(), "#1a2b3c".to_string());
    tokens
        .colors
        .insert("bad".to_string(), "#ZZZZZZ".to_string());
    tokens.spacing.insert("sm".to_string(), "8px".to_string());
    tokens
        .spacing
        .insert("broken".to_string(), "eight".to_string());

    let results = validate_tokens(&tokens);
    let colors = results.iter().find(|r| r.unit_id == "tokens.colors").unwrap();
    assert!(!colors.valid);
    assert_eq!(colors.issues.len(), 1);
    assert!(colors.issues[0].contains("bad = #ZZZZZZ"));

    let spacing = results
        .iter()
        .find(|r| r.unit_id == "tokens.spacing")
        .unwrap();
    assert!(!spacing.valid);
    assert!(spacing.issues[0].contains("broken = eight"));
}

#[test]
fn stub_checks_flag_each_missing_marker() {
    let complete = "---\ninterface Props {}\nconst { x } = Astro.props;\n---\n<div class=\"btn-ds\"></div>";
    assert!(check_stub(complete).is_empty());

    let bare = "<div></div>";
    let issues = check_stub(bare);
    assert!(issues.contains(&"missing frontmatter metadata block".to_string()));
    assert!(issues.contains(&"missing Props interface".to_string()));
    assert!(issues.contains(&"missing props destructuring".to_string()));
    assert!(issues.contains(&"not using design system classes".to_string()));
}

#[test]
fn get_issues_flattens_with_unit_prefix() {
    let results = vec![
        ValidationResult::new("CtaButton", vec!["missing preview story".to_string()]),
        ValidationResult::new("Hero", vec![]),
        ValidationResult::new(
            "tokens.colors",
            vec!["invalid color format: bad = oops".to_string()],
        ),
    ];

    let issues = get_issues(&results);
    assert_eq!(
        issues,
        vec![
            "CtaButton: missing preview story".to_string(),
            "tokens.colors: invalid color format: bad = oops".to_string(),
        ]
    );
}

#[test]
fn get_issues_is_empty_when_everything_is_valid() {
    let results = vec![
        ValidationResult::new("CtaButton", vec![]),
        ValidationResult::new("tokens.colors", vec![]),
    ];
    assert!(get_issues(&results).is_empty());
}

#[tokio::test]
async fn engine_reports_missing_stories_without_failing() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let config = test_config(workspace.path());

    let schema = serde_json::from_value(json!({
        "name": "cta_button",
        "schema": { "label": { "type": "text", "required": true } }
    }))
    .expect("schema deserializes");

    // Write the artifact set but not the story.
    let set = generator::generate(&config, &schema);
    generator::write_set(&set).await.expect("write set");

    let mut engine = ValidationEngine::new(&config);
    let outcome = engine.run(&TokenMap::default()).expect("run");

    assert_eq!(outcome.component_results.len(), 1);
    let result = &outcome.component_results[0];
    assert_eq!(result.unit_id, "CtaButton");
    assert!(!result.valid);
    assert!(result.issues.contains(&"missing preview story".to_string()));
    assert_eq!(outcome.missing_story_count(), 1);

    // Generated stubs are flagged for not yet using design-system classes;
    // that is an issue, not a failure.
    assert!(
        result
            .issues
            .contains(&"not using design system classes".to_string())
    );
}

#[tokio::test]
async fn engine_is_clean_for_styled_stub_with_story() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let config = test_config(workspace.path());

    fs::create_dir_all(&config.components_dir).expect("components dir");
    fs::create_dir_all(config.generated_stories_dir()).expect("stories dir");
    fs::write(
        config.stub_path("Hero"),
        "---\ninterface Props { title: string }\nconst { title } = Astro.props;\n---\n<section class=\"section-ds\">{title}</section>",
    )
    .expect("write stub");
    fs::write(config.story_path("Hero"), "export default {};").expect("write story");

    let mut engine = ValidationEngine::new(&config);
    let outcome = engine.run(&TokenMap::default()).expect("run");

    assert_eq!(outcome.component_results.len(), 1);
    assert!(outcome.component_results[0].valid);
    assert!(outcome.all_valid());
}

#[test]
fn unreadable_components_dir_is_fatal() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let config = test_config(&workspace.path().join("does-not-exist"));

    let mut engine = ValidationEngine::new(&config);
    let err = engine.run(&TokenMap::default()).expect_err("fatal");
    assert!(matches!(err, SyncError::FileSystem { .. }));
    assert!(err.is_fatal());
}
