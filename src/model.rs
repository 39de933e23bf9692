//! Core data model: registry schemas, generated artifacts, design tokens,
//! validation results, health reports, and webhook events.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// =============================================================================
// Component schemas (registry side)
// =============================================================================

/// A component definition as served by the schema registry. Read-only to
/// this system; created and edited externally.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentSchema {
    /// Registry-unique snake-or-kebab key, e.g. `cta_button`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Ordered field map. Field order drives render-fragment order in the
    /// generated stub, so insertion order must survive deserialization.
    #[serde(default)]
    pub schema: IndexMap<String, FieldSpec>,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub is_nestable: bool,
}

/// One declared option of an `option`/`options` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldOption {
    #[serde(default)]
    pub label: Option<String>,
    pub value: String,
}

/// A single field of a component schema.
///
/// `required == false` means the generated type and validation schema mark
/// the field optional. Fields that do not declare `required` are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub required: bool,
    pub description: Option<String>,
    pub default: Option<serde_json::Value>,
}

/// Closed set of field kinds the registry can declare. Anything outside
/// the set lands in [`FieldKind::Unknown`] and degrades to an opaque type
/// instead of failing generation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Textarea,
    Richtext,
    Number,
    Boolean,
    Datetime,
    Asset,
    Multiasset,
    Option { options: Vec<FieldOption> },
    Options { options: Vec<FieldOption> },
    Blocks { allowed_children: Vec<String> },
    Link,
    Table,
    Unknown { kind: String },
}

impl FieldKind {
    /// Registry-facing kind name, as shown in documentation tables.
    pub fn name(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Richtext => "richtext",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Datetime => "datetime",
            FieldKind::Asset => "asset",
            FieldKind::Multiasset => "multiasset",
            FieldKind::Option { .. } => "option",
            FieldKind::Options { .. } => "options",
            FieldKind::Blocks { .. } => "blocks",
            FieldKind::Link => "link",
            FieldKind::Table => "table",
            FieldKind::Unknown { kind } => kind,
        }
    }
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            description: None,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Wire shape of a registry field. The registry serves loosely-shaped
/// objects; this intermediate keeps the public model a closed union.
#[derive(Debug, Deserialize)]
struct RawFieldSpec {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    required: Option<bool>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "default_value")]
    default: Option<serde_json::Value>,
    #[serde(default)]
    options: Option<Vec<FieldOption>>,
    #[serde(default, alias = "restrict_components", alias = "component_whitelist")]
    allowed_children: Option<Vec<String>>,
}

impl<'de> Deserialize<'de> for FieldSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawFieldSpec::deserialize(deserializer)?;
        let kind = match raw.kind.as_str() {
            "text" => FieldKind::Text,
            "textarea" => FieldKind::Textarea,
            "richtext" => FieldKind::Richtext,
            "number" => FieldKind::Number,
            "boolean" => FieldKind::Boolean,
            "datetime" => FieldKind::Datetime,
            "asset" => FieldKind::Asset,
            "multiasset" => FieldKind::Multiasset,
            "option" => FieldKind::Option {
                options: raw.options.unwrap_or_default(),
            },
            "options" => FieldKind::Options {
                options: raw.options.unwrap_or_default(),
            },
            "blocks" => FieldKind::Blocks {
                allowed_children: raw.allowed_children.unwrap_or_default(),
            },
            "link" => FieldKind::Link,
            "table" => FieldKind::Table,
            other => FieldKind::Unknown {
                kind: other.to_string(),
            },
        };
        Ok(FieldSpec {
            kind,
            required: raw.required.unwrap_or(false),
            description: raw.description,
            default: raw.default,
        })
    }
}

// =============================================================================
// Generated artifacts
// =============================================================================

/// One generated output file: target path plus emitted text.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

/// The four coupled artifacts generated from one component schema. All
/// four are regenerated together and replace any prior version with the
/// same paths as one file-level transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedArtifactSet {
    /// PascalCase identifier derived from the registry name.
    pub component: String,
    pub component_stub: Artifact,
    pub type_definition: Artifact,
    pub validation_schema: Artifact,
    pub documentation: Artifact,
}

impl GeneratedArtifactSet {
    pub fn artifacts(&self) -> [&Artifact; 4] {
        [
            &self.component_stub,
            &self.type_definition,
            &self.validation_schema,
            &self.documentation,
        ]
    }
}

// =============================================================================
// Design tokens
// =============================================================================

/// Resolved text attributes of a typography token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyToken {
    pub font_family: String,
    pub font_size: String,
    pub font_weight: u32,
    pub line_height: String,
    pub letter_spacing: String,
}

/// Flat map of design tokens, keyed by sanitized token name per category.
/// Replaced wholesale on each sync; merges are shallow per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMap {
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    #[serde(default)]
    pub typography: BTreeMap<String, TypographyToken>,
    #[serde(default)]
    pub spacing: BTreeMap<String, String>,
    #[serde(default, rename = "borderRadius")]
    pub border_radius: BTreeMap<String, String>,
    #[serde(default)]
    pub shadows: BTreeMap<String, String>,
}

impl TokenMap {
    /// Shallow per-category merge: values from `newer` overwrite same-named
    /// keys; keys unseen in `newer` persist.
    pub fn merge_from(&mut self, newer: TokenMap) {
        self.colors.extend(newer.colors);
        self.typography.extend(newer.typography);
        self.spacing.extend(newer.spacing);
        self.border_radius.extend(newer.border_radius);
        self.shadows.extend(newer.shadows);
    }

    pub fn counts(&self) -> TokenCounts {
        TokenCounts {
            colors: self.colors.len(),
            typography: self.typography.len(),
            spacing: self.spacing.len(),
            border_radius: self.border_radius.len(),
            shadows: self.shadows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
            && self.typography.is_empty()
            && self.spacing.is_empty()
            && self.border_radius.is_empty()
            && self.shadows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub colors: usize,
    pub typography: usize,
    pub spacing: usize,
    #[serde(rename = "borderRadius")]
    pub border_radius: usize,
    pub shadows: usize,
}

// =============================================================================
// Validation and health reporting
// =============================================================================

/// Outcome of validating one unit (a stub file, a token category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub unit_id: String,
    pub valid: bool,
    pub issues: Vec<String>,
}

impl ValidationResult {
    pub fn new(unit_id: impl Into<String>, issues: Vec<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            valid: issues.is_empty(),
            issues,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Advisory text attached to a health report. Not a validated contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub message: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSnapshot {
    pub component_results: Vec<ValidationResult>,
    pub token_results: Vec<ValidationResult>,
    pub all_valid: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCounts {
    pub stubs: usize,
    pub stories: usize,
    pub documented: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub components: ComponentCounts,
    pub tokens: TokenCounts,
}

/// Point-in-time snapshot of pipeline health. Append-only; never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub validation: ValidationSnapshot,
    pub metrics: HealthMetrics,
    pub recommendations: Vec<Recommendation>,
}

// =============================================================================
// Webhook events
// =============================================================================

/// Raw change-notification body posted by the registry. Not persisted;
/// delivery is at-least-once, so everything downstream of this type must
/// be idempotent under redelivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub action: String,
    #[serde(default)]
    pub story: Option<StoryRef>,
    #[serde(default)]
    pub component: Option<ComponentSchema>,
}

/// Story envelope carried by story-scoped webhook events.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub full_slug: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum WebhookAction {
    Created,
    Updated,
    Published,
    Deleted,
    EntriesUpdated,
    #[strum(to_string = "{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum WebhookSubject {
    Component,
    Story,
    Datasource,
    #[strum(to_string = "{0}")]
    Other(String),
}

impl WebhookPayload {
    /// Classify the event into `(subject_type, action)`. Dotted actions
    /// (`component.created`) carry the subject explicitly; bare actions
    /// fall back to whichever envelope key is present.
    pub fn classify(&self) -> (WebhookSubject, WebhookAction) {
        let (subject_str, action_str) = match self.action.split_once('.') {
            Some((subject, action)) => (Some(subject), action),
            None => (None, self.action.as_str()),
        };

        let subject = match subject_str {
            Some("component") => WebhookSubject::Component,
            Some("story") => WebhookSubject::Story,
            Some("datasource") => WebhookSubject::Datasource,
            Some(other) => WebhookSubject::Other(other.to_string()),
            None if self.component.is_some() => WebhookSubject::Component,
            None if self.story.is_some() => WebhookSubject::Story,
            None => WebhookSubject::Other("unknown".to_string()),
        };

        let action = match action_str {
            "created" => WebhookAction::Created,
            "updated" => WebhookAction::Updated,
            "published" => WebhookAction::Published,
            "deleted" => WebhookAction::Deleted,
            "entries_updated" => WebhookAction::EntriesUpdated,
            other => WebhookAction::Other(other.to_string()),
        };

        (subject, action)
    }
}
