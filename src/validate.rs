//! Validation engine.
//!
//! Inspects the generated artifact tree and the token map against a fixed
//! rule set and aggregates pass/fail per unit. A failing check is a
//! non-fatal issue on the unit, never a hard failure; the engine only
//! errors when the artifact directory itself cannot be read.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::generator::DESIGN_SYSTEM_CLASS_ROOTS;
use crate::model::{TokenMap, ValidationResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;

/// Color tokens are 6-digit hex, optionally carrying a 2-digit alpha
/// suffix; the extractor emits 8-digit hex for translucent fills, so the
/// validator accepts it.
static COLOR_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}([0-9a-fA-F]{2})?$").expect("color pattern valid"));

static SPACING_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?(px|rem|em)$").expect("spacing pattern valid"));

/// Scan lifecycle of one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Idle,
    Scanning,
    Aggregating,
    Reported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub component_results: Vec<ValidationResult>,
    pub token_results: Vec<ValidationResult>,
}

impl ValidationOutcome {
    pub fn all_valid(&self) -> bool {
        self.component_results.iter().all(|r| r.valid)
            && self.token_results.iter().all(|r| r.valid)
    }

    pub fn invalid_component_count(&self) -> usize {
        self.component_results.iter().filter(|r| !r.valid).count()
    }

    pub fn missing_story_count(&self) -> usize {
        self.component_results
            .iter()
            .filter(|r| r.issues.iter().any(|i| i.contains("missing preview story")))
            .count()
    }

    pub fn token_issue_count(&self) -> usize {
        self.token_results.iter().map(|r| r.issues.len()).sum()
    }
}

pub struct ValidationEngine<'a> {
    config: &'a SyncConfig,
    state: RunState,
}

impl<'a> ValidationEngine<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self {
            config,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Scans every generated stub and the token map, then aggregates
    /// per-unit results. Fatal only when the components directory cannot
    /// be enumerated.
    pub fn run(&mut self, tokens: &TokenMap) -> SyncResult<ValidationOutcome> {
        self.state = RunState::Scanning;
        tracing::debug!(state = %self.state, "validation run started");

        let component_results = self.scan_stubs()?;
        let token_results = validate_tokens(tokens);

        self.state = RunState::Aggregating;
        let outcome = ValidationOutcome {
            component_results,
            token_results,
        };

        self.state = RunState::Reported;
        tracing::info!(
            components = outcome.component_results.len(),
            invalid = outcome.invalid_component_count(),
            token_issues = outcome.token_issue_count(),
            "validation run complete"
        );
        Ok(outcome)
    }

    fn scan_stubs(&self) -> SyncResult<Vec<ValidationResult>> {
        let dir = &self.config.components_dir;
        let entries =
            fs::read_dir(dir).map_err(|err| SyncError::filesystem(dir.clone(), err))?;

        let extension = self.config.stub_extension.as_str();
        let mut stub_names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| SyncError::filesystem(dir.clone(), err))?;
            let path = entry.path();
            let is_stub = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == extension);
            if is_stub {
                stub_names.push(path);
            }
        }
        stub_names.sort();

        let mut results = Vec::new();
        for path in stub_names {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            let mut issues = match fs::read_to_string(&path) {
                Ok(contents) => check_stub(&contents),
                Err(err) => vec![format!("file read error: {err}")],
            };

            // Cross-artifact sync: every stub needs a matching preview
            // story. A mismatch is an issue, not a generation failure.
            if !self.config.story_path(&name).exists() {
                issues.push("missing preview story".to_string());
            }

            results.push(ValidationResult::new(name, issues));
        }
        Ok(results)
    }
}

/// Fixed rule set for one component stub.
pub fn check_stub(contents: &str) -> Vec<String> {
    let mut issues = Vec::new();

    if !contents.contains("---") {
        issues.push("missing frontmatter metadata block".to_string());
    }
    if !contents.contains("interface Props") {
        issues.push("missing Props interface".to_string());
    }
    if !contents.contains("= Astro.props") {
        issues.push("missing props destructuring".to_string());
    }

    let uses_design_system = DESIGN_SYSTEM_CLASS_ROOTS
        .iter()
        .any(|root| contents.contains(root));
    if !uses_design_system {
        issues.push("not using design system classes".to_string());
    }

    issues
}

pub fn is_valid_color(value: &str) -> bool {
    COLOR_VALUE.is_match(value)
}

pub fn is_valid_spacing(value: &str) -> bool {
    SPACING_VALUE.is_match(value)
}

/// Validates token values per category. One result per category, with one
/// issue per offending token.
pub fn validate_tokens(tokens: &TokenMap) -> Vec<ValidationResult> {
    let color_issues = tokens
        .colors
        .iter()
        .filter(|(_, value)| !is_valid_color(value))
        .map(|(name, value)| format!("invalid color format: {name} = {value}"))
        .collect();

    let spacing_issues = tokens
        .spacing
        .iter()
        .filter(|(_, value)| !is_valid_spacing(value))
        .map(|(name, value)| format!("invalid spacing format: {name} = {value}"))
        .collect();

    vec![
        ValidationResult::new("tokens.colors", color_issues),
        ValidationResult::new("tokens.spacing", spacing_issues),
    ]
}

/// Flattens all per-unit issues into one ordered list of human-readable
/// strings, each prefixed with its unit identifier.
pub fn get_issues(results: &[ValidationResult]) -> Vec<String> {
    results
        .iter()
        .flat_map(|result| {
            result
                .issues
                .iter()
                .map(move |issue| format!("{}: {}", result.unit_id, issue))
        })
        .collect()
}
