//! Run orchestration.
//!
//! One logical worker per invocation: fetch schemas, generate artifact
//! sets with per-schema failure recovery, validate, report. Token sync
//! runs independently and its failure never blocks generation. Bulk
//! registry iteration is paced with a cooperative inter-schema delay to
//! respect the registry's rate limits.

use crate::config::SyncConfig;
use crate::design_tool::DesignToolClient;
use crate::error::{SyncError, SyncResult};
use crate::generator;
use crate::health::HealthEngine;
use crate::model::{ComponentSchema, HealthReport, TokenMap};
use crate::registry::RegistryClient;
use crate::tokens::{self, TokenStore};
use crate::validate::{ValidationEngine, ValidationOutcome, get_issues};
use std::path::PathBuf;

/// Tally of one bulk generation run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub generated: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.generated + self.failed
    }
}

#[derive(Debug, Default)]
pub struct FullSyncReport {
    pub tokens: Option<TokenMap>,
    pub token_error: Option<String>,
    pub generation: RunSummary,
    pub issues: Vec<String>,
    pub health: Option<HealthReport>,
    pub report_path: Option<PathBuf>,
}

impl FullSyncReport {
    /// Whether any fatal error occurred during the run.
    pub fn had_fatal_error(&self) -> bool {
        self.token_error.is_some()
    }
}

/// Generates the artifact set (and preview story) for one schema.
pub async fn generate_and_write(
    config: &SyncConfig,
    schema: &ComponentSchema,
) -> SyncResult<Vec<PathBuf>> {
    let set = generator::generate(config, schema);
    let mut written = generator::write_set(&set)
        .await
        .map_err(|err| match err {
            // Filesystem trouble inside one schema's transaction is that
            // schema's failure, not the run's.
            err @ SyncError::FileSystem { .. } => SyncError::generation(&schema.name, err),
            other => other,
        })?;

    if config.auto_create_stories {
        let story = generator::generate_story(config, schema);
        if let Some(path) = generator::write_story(&story)
            .await
            .map_err(|err| SyncError::generation(&schema.name, err))?
        {
            written.push(path);
        }
    }
    Ok(written)
}

/// Generates artifact sets for every schema in the registry. A single
/// schema's failure is logged and tallied; siblings proceed.
pub async fn generate_all(config: &SyncConfig) -> SyncResult<RunSummary> {
    let registry = RegistryClient::new(config)?;
    let schemas = registry.fetch_all_components().await?;
    tracing::info!(count = schemas.len(), "fetched component schemas");

    let mut summary = RunSummary::default();
    for (index, schema) in schemas.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(config.pacing).await;
        }
        match generate_and_write(config, schema).await {
            Ok(written) => {
                summary.generated += 1;
                tracing::info!(
                    component = %schema.name,
                    files = written.len(),
                    progress = format!("{}/{}", index + 1, schemas.len()),
                    "generated"
                );
            }
            Err(err) => {
                summary.failed += 1;
                summary.failures.push(err.to_string());
                tracing::warn!(component = %schema.name, %err, "generation failed, continuing");
            }
        }
    }
    Ok(summary)
}

/// Generates the artifact set for one named schema.
pub async fn generate_one(config: &SyncConfig, name: &str) -> SyncResult<Vec<PathBuf>> {
    let registry = RegistryClient::new(config)?;
    let Some(schema) = registry.fetch_component(name).await? else {
        return Err(SyncError::generation(name, "component not found in registry"));
    };
    generate_and_write(config, &schema).await
}

/// Fetches the design document and style catalogue, extracts tokens, and
/// merges them into the store. Returns the merged map.
pub async fn sync_tokens(config: &SyncConfig) -> SyncResult<TokenMap> {
    let client = DesignToolClient::new(config)?;
    let (file, styles) = tokio::try_join!(client.fetch_file(), client.fetch_styles())?;
    tracing::info!(styles = styles.len(), "fetched design tool data");

    let extracted = tokens::extract(&file.document, &styles);
    let store = TokenStore::new(&config.tokens_file);
    let merged = store.merge_and_save(extracted)?;
    tracing::info!(counts = ?merged.counts(), "design tokens synced");
    Ok(merged)
}

/// Validates the artifact tree against the stored token map.
pub fn validate(config: &SyncConfig) -> SyncResult<(ValidationOutcome, TokenMap)> {
    let store = TokenStore::new(&config.tokens_file);
    let token_map = store.load()?;
    let mut engine = ValidationEngine::new(config);
    let outcome = engine.run(&token_map)?;
    Ok((outcome, token_map))
}

/// The full pipeline: token sync, bulk generation, validation, health
/// report. Token sync failure is fatal to token sync only; generation
/// still runs, and the failure is carried in the report.
pub async fn full_sync(
    config: &SyncConfig,
    skip_tokens: bool,
    skip_validation: bool,
) -> SyncResult<FullSyncReport> {
    let mut report = FullSyncReport::default();

    if !skip_tokens && config.has_design_tool() {
        match sync_tokens(config).await {
            Ok(map) => report.tokens = Some(map),
            Err(err) => {
                tracing::error!(category = err.category(), %err, "token sync failed");
                report.token_error = Some(err.to_string());
            }
        }
    } else if !skip_tokens {
        tracing::warn!("design tool not configured, skipping token sync");
    }

    report.generation = generate_all(config).await?;

    if !skip_validation {
        let (outcome, token_map) = validate(config)?;
        report.issues = get_issues(&outcome.component_results)
            .into_iter()
            .chain(get_issues(&outcome.token_results))
            .collect();

        let health = HealthEngine::new(config);
        let built = health.build_report(&outcome, &token_map);
        report.report_path = Some(health.save_report(&built)?);
        health.save_validation(&outcome)?;
        report.health = Some(built);
    }

    Ok(report)
}
