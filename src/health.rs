//! Health reporting.
//!
//! Builds a point-in-time snapshot from the latest validation outcome and
//! the token map: per-unit results, simple counts, and heuristic
//! recommendations. Reports are append-only, timestamped JSON files under
//! the metrics directory.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::model::{
    ComponentCounts, HealthMetrics, HealthReport, Recommendation, Severity, TokenMap,
    ValidationSnapshot,
};
use crate::validate::ValidationOutcome;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Stub count above which the report suggests lazy loading.
const LARGE_COMPONENT_COUNT: usize = 50;

pub struct HealthEngine<'a> {
    config: &'a SyncConfig,
}

impl<'a> HealthEngine<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    pub fn build_report(&self, outcome: &ValidationOutcome, tokens: &TokenMap) -> HealthReport {
        let metrics = self.collect_metrics(tokens);
        let recommendations = recommendations_for(outcome, &metrics);

        HealthReport {
            timestamp: Utc::now(),
            validation: ValidationSnapshot {
                component_results: outcome.component_results.clone(),
                token_results: outcome.token_results.clone(),
                all_valid: outcome.all_valid(),
            },
            metrics,
            recommendations,
        }
    }

    fn collect_metrics(&self, tokens: &TokenMap) -> HealthMetrics {
        HealthMetrics {
            components: ComponentCounts {
                stubs: count_files(&self.config.components_dir, &self.config.stub_extension),
                stories: count_files(&self.config.generated_stories_dir(), "tsx"),
                documented: count_files(&self.config.docs_dir(), "md"),
            },
            tokens: tokens.counts(),
        }
    }

    /// Persists the report as a new timestamped snapshot. Existing
    /// snapshots are never touched.
    pub fn save_report(&self, report: &HealthReport) -> SyncResult<PathBuf> {
        let dir = self.config.metrics_dir();
        fs::create_dir_all(&dir).map_err(|err| SyncError::filesystem(&dir, err))?;

        let stamp = report.timestamp.format("%Y-%m-%dT%H-%M-%S%.3fZ");
        let path = dir.join(format!("health-report-{stamp}.json"));
        let json = serde_json::to_string_pretty(report)
            .map_err(|err| SyncError::filesystem(&path, std::io::Error::other(err)))?;
        fs::write(&path, json).map_err(|err| SyncError::filesystem(&path, err))?;
        tracing::info!(path = %path.display(), "health report saved");
        Ok(path)
    }

    /// Persists the raw validation outcome next to the health reports,
    /// one snapshot per day (overwritten within the day).
    pub fn save_validation(&self, outcome: &ValidationOutcome) -> SyncResult<PathBuf> {
        let dir = self.config.metrics_dir();
        fs::create_dir_all(&dir).map_err(|err| SyncError::filesystem(&dir, err))?;

        let snapshot = ValidationSnapshot {
            component_results: outcome.component_results.clone(),
            token_results: outcome.token_results.clone(),
            all_valid: outcome.all_valid(),
        };
        let path = dir.join(format!("validation-{}.json", Utc::now().format("%Y-%m-%d")));
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|err| SyncError::filesystem(&path, std::io::Error::other(err)))?;
        fs::write(&path, json).map_err(|err| SyncError::filesystem(&path, err))?;
        Ok(path)
    }
}

fn count_files(dir: &Path, extension: &str) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == extension)
        })
        .count()
}

fn recommendations_for(
    outcome: &ValidationOutcome,
    metrics: &HealthMetrics,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let invalid = outcome.invalid_component_count();
    if invalid > 0 {
        recommendations.push(Recommendation {
            severity: Severity::Warning,
            message: format!("{invalid} component stubs have validation issues"),
            action: "review and fix stub validation issues".to_string(),
        });
    }

    let missing_stories = outcome.missing_story_count();
    if missing_stories > 0 {
        recommendations.push(Recommendation {
            severity: Severity::Info,
            message: format!("{missing_stories} components are missing preview stories"),
            action: "run the generator to create missing stories".to_string(),
        });
    }

    if outcome.token_issue_count() > 0 {
        recommendations.push(Recommendation {
            severity: Severity::Error,
            message: "design tokens have validation issues".to_string(),
            action: "fix token formats in the design tool or the token store".to_string(),
        });
    }

    if metrics.components.stubs > LARGE_COMPONENT_COUNT {
        recommendations.push(Recommendation {
            severity: Severity::Info,
            message: "large component count detected".to_string(),
            action: "consider lazy loading generated components".to_string(),
        });
    }

    recommendations
}
