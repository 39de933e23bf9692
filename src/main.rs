use anyhow::Result;
use clap::Parser;
use design_sync::config::{CliArgs, Command, SyncConfig};
use design_sync::health::HealthEngine;
use design_sync::logging::{LoggingConfig, init_logging};
use design_sync::validate::get_issues;
use design_sync::{pipeline, server};

#[tokio::main]
async fn main() -> Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let command = cli.command.clone();
    let config = SyncConfig::from_args(&cli)?;

    match command {
        Command::Sync {
            skip_tokens,
            skip_validation,
        } => {
            config.ensure_registry()?;
            let report = pipeline::full_sync(&config, skip_tokens, skip_validation).await?;

            if let Some(err) = &report.token_error {
                println!("token sync failed: {err}");
            }
            println!(
                "generated {}/{} components ({} failed)",
                report.generation.generated,
                report.generation.total(),
                report.generation.failed
            );
            for failure in &report.generation.failures {
                println!("  - {failure}");
            }
            if !report.issues.is_empty() {
                println!("{} validation issues:", report.issues.len());
                for issue in &report.issues {
                    println!("  - {issue}");
                }
            }
            if let Some(path) = &report.report_path {
                println!("health report: {}", path.display());
            }
            if report.had_fatal_error() {
                std::process::exit(1);
            }
        }
        Command::Generate { component } => {
            config.ensure_registry()?;
            match component {
                Some(name) => {
                    let written = pipeline::generate_one(&config, &name).await?;
                    println!("generated {name} ({} files)", written.len());
                }
                None => {
                    let summary = pipeline::generate_all(&config).await?;
                    println!(
                        "generated {}/{} components ({} failed)",
                        summary.generated,
                        summary.total(),
                        summary.failed
                    );
                    for failure in &summary.failures {
                        println!("  - {failure}");
                    }
                    if summary.failed > 0 && summary.generated == 0 {
                        std::process::exit(1);
                    }
                }
            }
        }
        Command::Tokens => {
            config.ensure_design_tool()?;
            let merged = pipeline::sync_tokens(&config).await?;
            let counts = merged.counts();
            println!(
                "tokens synced: {} colors, {} typography, {} spacing, {} radii, {} shadows",
                counts.colors,
                counts.typography,
                counts.spacing,
                counts.border_radius,
                counts.shadows
            );
        }
        Command::Validate { strict } => {
            let (outcome, _) = pipeline::validate(&config)?;
            let issues: Vec<String> = get_issues(&outcome.component_results)
                .into_iter()
                .chain(get_issues(&outcome.token_results))
                .collect();

            if issues.is_empty() {
                println!("all components valid");
            } else {
                println!("found {} issues:", issues.len());
                for issue in &issues {
                    println!("  - {issue}");
                }
                if strict {
                    std::process::exit(1);
                }
            }
        }
        Command::Health => {
            let (outcome, token_map) = pipeline::validate(&config)?;
            let engine = HealthEngine::new(&config);
            let report = engine.build_report(&outcome, &token_map);
            let path = engine.save_report(&report)?;

            println!(
                "components: {} stubs, {} stories, {} documented",
                report.metrics.components.stubs,
                report.metrics.components.stories,
                report.metrics.components.documented
            );
            println!(
                "tokens: {} colors, {} typography, {} spacing",
                report.metrics.tokens.colors,
                report.metrics.tokens.typography,
                report.metrics.tokens.spacing
            );
            if report.validation.all_valid {
                println!("all valid");
            }
            for rec in &report.recommendations {
                println!("[{}] {} -> {}", rec.severity, rec.message, rec.action);
            }
            println!("report saved: {}", path.display());
        }
        Command::Config => {
            let set = |value: &str| if value.is_empty() { "not set" } else { "set" };
            println!("registry:");
            println!("  base URL: {}", set(&config.registry_base_url));
            println!("  space id: {}", set(&config.registry_space_id));
            println!(
                "  management token: {}",
                set(&config.registry_management_token)
            );
            println!(
                "  content-delivery token: {}",
                set(&config.registry_preview_token)
            );
            println!(
                "  webhook secret: {}",
                if config.webhook_secret.is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
            println!("design tool:");
            println!("  base URL: {}", set(&config.design_tool_base_url));
            println!("  access token: {}", set(&config.design_tool_token));
            println!("  file key: {}", set(&config.design_tool_file_key));
            println!("downstream:");
            println!(
                "  build hook: {}",
                if config.build_hook_url.is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
            println!(
                "  publish command: {}",
                if config.publish_command.is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
            println!("pipeline:");
            println!("  create stories: {}", config.auto_create_stories);
            println!("  auto deploy: {}", config.auto_deploy);
        }
        Command::Serve => {
            server::run_server(config).await?;
        }
    }

    Ok(())
}
