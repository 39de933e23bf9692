use std::fs;

use clap::Parser;
use design_sync::{CliArgs, SyncConfig};

#[test]
fn merges_config_file_and_cli_overrides() {
    let config_dir = tempfile::tempdir().expect("config tempdir");
    let config_path = config_dir.path().join("sync.yaml");
    let yaml = "registry_base_url: https://registry.example/v1\n\
                registry_space_id: '12345'\n\
                registry_management_token: file-token\n\
                registry_preview_token: preview-token\n\
                pacing_ms: 450\n";
    fs::write(&config_path, yaml).expect("write config");

    let args = CliArgs::parse_from([
        "design-sync",
        "--config",
        config_path.to_str().unwrap(),
        "--registry-management-token",
        "cli-token",
        "validate",
    ]);
    let config = SyncConfig::from_args(&args).expect("config");

    assert_eq!(config.registry_base_url, "https://registry.example/v1");
    assert_eq!(config.registry_space_id, "12345");
    // CLI value wins over the file value.
    assert_eq!(config.registry_management_token, "cli-token");
    assert_eq!(config.registry_preview_token, "preview-token");
    assert_eq!(config.pacing, std::time::Duration::from_millis(450));
    assert!(config.ensure_registry().is_ok());
}

#[test]
fn ensure_registry_lists_missing_keys() {
    let args = CliArgs::parse_from(["design-sync", "validate"]);
    let config = SyncConfig::from_args(&args).expect("config");

    let err = config.ensure_registry().expect_err("missing credentials");
    let message = err.to_string();
    assert!(message.contains("registry space id"), "{message}");
    assert!(message.contains("registry management token"), "{message}");
    assert!(message.contains("registry content-delivery token"), "{message}");
}

#[test]
fn ensure_design_tool_lists_missing_keys() {
    let args = CliArgs::parse_from(["design-sync", "tokens"]);
    let config = SyncConfig::from_args(&args).expect("config");

    assert!(!config.has_design_tool());
    let err = config.ensure_design_tool().expect_err("missing credentials");
    assert!(err.to_string().contains("design tool access token"));
}

#[test]
fn stub_extension_strips_leading_dot() {
    let args = CliArgs::parse_from(["design-sync", "--stub-extension", ".vue", "validate"]);
    let config = SyncConfig::from_args(&args).expect("config");

    assert_eq!(config.stub_extension, "vue");
    assert!(
        config
            .stub_path("CtaButton")
            .to_string_lossy()
            .ends_with("CtaButton.vue")
    );
}

#[test]
fn derived_paths_share_the_pascal_identifier() {
    let args = CliArgs::parse_from(["design-sync", "validate"]);
    let config = SyncConfig::from_args(&args).expect("config");

    assert!(
        config
            .type_path("HeroBanner")
            .to_string_lossy()
            .ends_with("types/HeroBanner.ts")
    );
    assert!(
        config
            .schema_path("HeroBanner")
            .to_string_lossy()
            .ends_with("schemas/HeroBanner.schema.ts")
    );
    assert!(
        config
            .doc_path("HeroBanner")
            .to_string_lossy()
            .ends_with("docs/HeroBanner.md")
    );
    assert!(
        config
            .story_path("HeroBanner")
            .to_string_lossy()
            .ends_with("generated/HeroBanner.stories.tsx")
    );
}

#[test]
fn no_flags_disable_stories_and_deploy() {
    let args = CliArgs::parse_from(["design-sync", "--no-stories", "--no-deploy", "validate"]);
    let config = SyncConfig::from_args(&args).expect("config");

    assert!(!config.auto_create_stories);
    assert!(!config.auto_deploy);
}

#[test]
fn unsupported_config_extension_is_rejected() {
    let config_dir = tempfile::tempdir().expect("config tempdir");
    let config_path = config_dir.path().join("sync.toml");
    fs::write(&config_path, "x = 1").expect("write config");

    let args = CliArgs::parse_from([
        "design-sync",
        "--config",
        config_path.to_str().unwrap(),
        "validate",
    ]);
    let err = SyncConfig::from_args(&args).expect_err("toml is unsupported");
    assert!(err.to_string().contains("unsupported config extension"));
}
