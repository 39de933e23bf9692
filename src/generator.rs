//! Artifact generation.
//!
//! `generate` is a pure function from one component schema to the four
//! coupled artifacts (stub, type definition, validation schema, docs) plus
//! an optional preview story. `write_set` stages all four to temp files
//! and persists them together, so a prior generation is never left half
//! replaced. Emission is deterministic: the same schema always produces
//! byte-identical artifacts.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::model::{
    Artifact, ComponentSchema, FieldKind, FieldSpec, GeneratedArtifactSet,
};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Class roots the validation engine recognizes as design-system styling.
pub const DESIGN_SYSTEM_CLASS_ROOTS: &[&str] =
    &["btn-ds", "card-ds", "heading-ds", "section-ds", "input-ds"];

/// Splits on `_`/`-` and title-cases each word. Idempotent: applying it to
/// an already-PascalCase identifier is a no-op, which matters because the
/// result also derives file paths that later stages look up.
pub fn to_pascal_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// CSS class root for a registry name: underscores become dashes.
pub fn to_kebab_case(name: &str) -> String {
    name.replace('_', "-")
}

// =============================================================================
// Type mapping
// =============================================================================

const ASSET_OBJECT: &str = "{
    id: number;
    alt: string;
    name: string;
    focus: string;
    title: string;
    filename: string;
    copyright: string;
    fieldtype: 'asset';
  }";

const LINK_OBJECT: &str = "{
    id: string;
    url: string;
    linktype: string;
    cached_url: string;
  }";

const TABLE_OBJECT: &str = "{
    thead: Array<{ value: string }>;
    tbody: Array<Array<{ value: string }>>;
  }";

fn option_union(options: &[crate::model::FieldOption]) -> String {
    options
        .iter()
        .map(|opt| format!("'{}'", opt.value))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// The fixed schema-kind to generated-type table. Unrecognized kinds fall
/// back to `any`, never an error.
pub fn ts_type(spec: &FieldSpec) -> String {
    match &spec.kind {
        FieldKind::Text | FieldKind::Textarea | FieldKind::Richtext | FieldKind::Datetime => {
            "string".to_string()
        }
        FieldKind::Number => "number".to_string(),
        FieldKind::Boolean => "boolean".to_string(),
        FieldKind::Asset => ASSET_OBJECT.to_string(),
        FieldKind::Multiasset => format!("Array<{ASSET_OBJECT}>"),
        FieldKind::Option { options } => {
            if options.is_empty() {
                "string".to_string()
            } else {
                option_union(options)
            }
        }
        FieldKind::Options { options } => {
            if options.is_empty() {
                "string[]".to_string()
            } else {
                format!("Array<{}>", option_union(options))
            }
        }
        FieldKind::Blocks { .. } => "any[]".to_string(),
        FieldKind::Link => LINK_OBJECT.to_string(),
        FieldKind::Table => TABLE_OBJECT.to_string(),
        FieldKind::Unknown { .. } => "any".to_string(),
    }
}

/// Runtime-validator mirror of [`ts_type`]. Optionality is appended by the
/// caller so both forms agree on which fields are optional.
pub fn zod_type(spec: &FieldSpec) -> String {
    match &spec.kind {
        FieldKind::Text | FieldKind::Textarea | FieldKind::Richtext | FieldKind::Datetime => {
            "z.string()".to_string()
        }
        FieldKind::Number => "z.number()".to_string(),
        FieldKind::Boolean => "z.boolean()".to_string(),
        FieldKind::Asset => {
            "z.object({ filename: z.string(), alt: z.string().optional() })".to_string()
        }
        FieldKind::Multiasset => {
            "z.array(z.object({ filename: z.string(), alt: z.string().optional() }))".to_string()
        }
        FieldKind::Option { options } => {
            if options.is_empty() {
                "z.string()".to_string()
            } else {
                let values = options
                    .iter()
                    .map(|opt| format!("'{}'", opt.value))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("z.enum([{values}])")
            }
        }
        FieldKind::Options { options } => {
            if options.is_empty() {
                "z.array(z.string())".to_string()
            } else {
                let values = options
                    .iter()
                    .map(|opt| format!("'{}'", opt.value))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("z.array(z.enum([{values}]))")
            }
        }
        FieldKind::Blocks { .. } => "z.array(z.any())".to_string(),
        FieldKind::Link => {
            "z.object({ url: z.string(), cached_url: z.string().optional() })".to_string()
        }
        FieldKind::Table => {
            "z.object({ thead: z.array(z.object({ value: z.string() })), tbody: z.array(z.array(z.object({ value: z.string() }))) })"
                .to_string()
        }
        FieldKind::Unknown { .. } => "z.any()".to_string(),
    }
}

// =============================================================================
// Generation
// =============================================================================

/// Generates the four coupled artifacts for one schema. Pure: no I/O.
pub fn generate(config: &SyncConfig, schema: &ComponentSchema) -> GeneratedArtifactSet {
    let pascal = to_pascal_case(&schema.name);
    GeneratedArtifactSet {
        component: pascal.clone(),
        component_stub: Artifact {
            path: config.stub_path(&pascal),
            contents: render_stub(schema, &pascal),
        },
        type_definition: Artifact {
            path: config.type_path(&pascal),
            contents: render_types(schema, &pascal),
        },
        validation_schema: Artifact {
            path: config.schema_path(&pascal),
            contents: render_validation_schema(schema, &pascal),
        },
        documentation: Artifact {
            path: config.doc_path(&pascal),
            contents: render_docs(config, schema, &pascal),
        },
    }
}

/// Generates the preview story fixture. Emitted alongside the artifact
/// set but not part of the atomic four-set.
pub fn generate_story(config: &SyncConfig, schema: &ComponentSchema) -> Artifact {
    let pascal = to_pascal_case(&schema.name);
    Artifact {
        path: config.story_path(&pascal),
        contents: render_story(schema, &pascal),
    }
}

fn render_stub(schema: &ComponentSchema, pascal: &str) -> String {
    let props = schema
        .schema
        .iter()
        .map(|(key, field)| {
            let optional = if field.required { "" } else { "?" };
            format!("  {key}{optional}: {};", ts_type(field))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let destructuring = schema
        .schema
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let render_logic = render_fragments(schema);
    let class_root = to_kebab_case(&schema.name);

    format!(
        r#"---
/**
 * {pascal} component stub.
 * Generated from the `{name}` registry schema. Regenerated on schema
 * change; do not edit by hand.
 */

interface Props {{
{props}
}}

const {{ {destructuring} }} = Astro.props;
---

<div class="{class_root}-component">
{render_logic}
</div>

<style>
  .{class_root}-component {{
    /* styling hooks resolve through the design token map */
  }}
</style>
"#,
        name = schema.name,
    )
}

/// One conditional render fragment per field, in schema order.
fn render_fragments(schema: &ComponentSchema) -> String {
    if schema.schema.is_empty() {
        return "  <!-- component content -->".to_string();
    }
    schema
        .schema
        .iter()
        .map(|(key, field)| match &field.kind {
            FieldKind::Text | FieldKind::Textarea => {
                format!("  {{{key} && <p>{{{key}}}</p>}}")
            }
            FieldKind::Richtext => {
                format!("  {{{key} && <div set:html={{{key}}} />}}")
            }
            FieldKind::Asset => {
                format!("  {{{key}?.filename && <img src={{{key}.filename}} alt={{{key}.alt || ''}} />}}")
            }
            FieldKind::Boolean => {
                format!("  {{{key} && <div class=\"active\">Active</div>}}")
            }
            FieldKind::Blocks { .. } => {
                format!(
                    "  {{{key}?.map((block, index) => (\n    <Fragment key={{index}}>\n      <!-- render nested blocks here -->\n    </Fragment>\n  ))}}"
                )
            }
            _ => format!("  {{{key} && <div>{{JSON.stringify({key})}}</div>}}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_types(schema: &ComponentSchema, pascal: &str) -> String {
    let mut aliases = Vec::new();
    for (key, field) in &schema.schema {
        match &field.kind {
            FieldKind::Option { options } if !options.is_empty() => {
                aliases.push(format!(
                    "export type {}Option = {};",
                    to_pascal_case(key),
                    option_union(options)
                ));
            }
            FieldKind::Blocks { allowed_children } if !allowed_children.is_empty() => {
                let union = allowed_children
                    .iter()
                    .map(|name| format!("'{name}'"))
                    .collect::<Vec<_>>()
                    .join(" | ");
                aliases.push(format!("export type {}Block = {union};", to_pascal_case(key)));
            }
            _ => {}
        }
    }
    let alias_block = if aliases.is_empty() {
        String::new()
    } else {
        format!("{}\n\n", aliases.join("\n\n"))
    };

    let props = schema
        .schema
        .iter()
        .map(|(key, field)| {
            let optional = if field.required { "" } else { "?" };
            let description = field
                .description
                .as_deref()
                .map(|d| format!("  /** {d} */\n"))
                .unwrap_or_default();
            format!("{description}  {key}{optional}: {};", ts_type(field))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"/**
 * Type definitions for the {pascal} component.
 * Generated from the registry schema.
 */

{alias_block}export interface {pascal}Props {{
{props}
}}

export interface {pascal}Story {{
  content: {pascal}Props;
  id: number;
  name: string;
  slug: string;
  full_slug: string;
  created_at: string;
  updated_at: string;
  published_at: string;
  uuid: string;
}}
"#
    )
}

fn render_validation_schema(schema: &ComponentSchema, pascal: &str) -> String {
    let fields = schema
        .schema
        .iter()
        .map(|(key, field)| {
            let optional = if field.required { "" } else { ".optional()" };
            format!("  {key}: {}{optional},", zod_type(field))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"/**
 * Runtime validation schema for the {pascal} component.
 * Generated from the registry schema.
 */

import {{ z }} from 'zod';

export const {pascal}Schema = z.object({{
{fields}
}});

export type {pascal} = z.infer<typeof {pascal}Schema>;
"#
    )
}

fn render_docs(config: &SyncConfig, schema: &ComponentSchema, pascal: &str) -> String {
    let rows = schema
        .schema
        .iter()
        .map(|(key, field)| {
            let required = if field.required { "Yes" } else { "No" };
            let description = field.description.as_deref().unwrap_or("-");
            format!("| {key} | {} | {required} | {description} |", field.kind.name())
        })
        .collect::<Vec<_>>()
        .join("\n");

    let display_name = schema.display_name.as_deref().unwrap_or(pascal);
    let stub_path = config.stub_path(pascal);
    let type_path = config.type_path(pascal);
    let schema_path = config.schema_path(pascal);
    let story_path = config.story_path(pascal);

    format!(
        r#"# {pascal} Component

{display_name} component generated from the schema registry.

## Usage

```astro
---
import {pascal} from '../{stub}';
---

<{pascal}
  prop1="value1"
  prop2="value2"
/>
```

## Props

| Property | Type | Required | Description |
|----------|------|----------|-------------|
{rows}

## Registry Configuration

- **Component Name**: `{name}`
- **Display Name**: {display}
- **Is Root**: {is_root}
- **Is Nestable**: {is_nestable}

## Generated Files

- **Component Stub**: `{stub}`
- **Type Definitions**: `{types}`
- **Validation Schema**: `{schemas}`
- **Preview Story**: `{story}`
"#,
        stub = stub_path.display(),
        types = type_path.display(),
        schemas = schema_path.display(),
        story = story_path.display(),
        name = schema.name,
        display = schema.display_name.as_deref().unwrap_or("N/A"),
        is_root = if schema.is_root { "Yes" } else { "No" },
        is_nestable = if schema.is_nestable { "Yes" } else { "No" },
    )
}

fn render_story(schema: &ComponentSchema, pascal: &str) -> String {
    let args = schema
        .schema
        .iter()
        .map(|(key, field)| {
            let value = placeholder_value(field);
            let rendered = serde_json::to_string(&value).unwrap_or_else(|_| "null".to_string());
            format!("    {key}: {rendered},")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"import type {{ Meta, StoryObj }} from '@storybook/react';
import React from 'react';

// Structural preview only; the stub renders in the host framework.
const {pascal} = ({{ ...props }}) => {{
  return (
    <div className="preview-fixture">
      <h3>{pascal} Component</h3>
      <pre>{{JSON.stringify(props, null, 2)}}</pre>
    </div>
  );
}};

const meta = {{
  title: 'Generated/{pascal}',
  component: {pascal},
  parameters: {{
    layout: 'centered',
    docs: {{
      description: {{
        component: 'Registry component: {name}',
      }},
    }},
  }},
  tags: ['autodocs'],
}} satisfies Meta<typeof {pascal}>;

export default meta;
type Story = StoryObj<typeof meta>;

export const Default: Story = {{
  args: {{
{args}
  }},
}};
"#,
        name = schema.name,
    )
}

/// Placeholder arg for a preview story. A declared schema default wins;
/// otherwise a fixed per-kind sample.
fn placeholder_value(field: &FieldSpec) -> serde_json::Value {
    use serde_json::{Value, json};

    if let Some(default) = &field.default {
        return default.clone();
    }

    match &field.kind {
        FieldKind::Text | FieldKind::Textarea => json!("Sample text"),
        FieldKind::Richtext => json!("<p>Sample rich text</p>"),
        FieldKind::Number => json!(0),
        FieldKind::Boolean => json!(false),
        FieldKind::Asset => json!({
            "filename": "https://placehold.co/300x200",
            "alt": "Placeholder"
        }),
        FieldKind::Blocks { .. } => json!([]),
        FieldKind::Option { options } => options
            .first()
            .map(|opt| json!(opt.value))
            .unwrap_or_else(|| json!("")),
        FieldKind::Options { .. } => json!([]),
        _ => Value::Null,
    }
}

// =============================================================================
// Writing and deletion
// =============================================================================

fn sha256_hex(contents: &[u8]) -> String {
    let digest = Sha256::digest(contents);
    let mut out = String::with_capacity(64);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

fn staging_path(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    target.with_file_name(format!(".{file_name}.staged"))
}

async fn stage_artifact(artifact: &Artifact) -> SyncResult<Option<PathBuf>> {
    let parent = artifact.path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|err| SyncError::filesystem(parent, err))?;

    // Unchanged contents are left alone so no-op regeneration preserves
    // file mtimes.
    if let Ok(existing) = tokio::fs::read(&artifact.path).await {
        if sha256_hex(&existing) == sha256_hex(artifact.contents.as_bytes()) {
            return Ok(None);
        }
    }

    let staged = staging_path(&artifact.path);
    tokio::fs::write(&staged, artifact.contents.as_bytes())
        .await
        .map_err(|err| SyncError::filesystem(&staged, err))?;
    Ok(Some(staged))
}

/// Writes all four artifacts of a set as one file-level transaction: every
/// artifact is staged first, and targets are only replaced once staging of
/// the whole set succeeded. Returns the paths actually rewritten.
pub async fn write_set(set: &GeneratedArtifactSet) -> SyncResult<Vec<PathBuf>> {
    let [stub, types, schema, docs] = set.artifacts();

    let staged = tokio::try_join!(
        stage_artifact(stub),
        stage_artifact(types),
        stage_artifact(schema),
        stage_artifact(docs)
    );

    let staged = match staged {
        Ok((a, b, c, d)) => [(stub, a), (types, b), (schema, c), (docs, d)],
        Err(err) => {
            // Roll back whatever was staged; nothing was persisted yet.
            for artifact in set.artifacts() {
                let _ = tokio::fs::remove_file(staging_path(&artifact.path)).await;
            }
            return Err(err);
        }
    };

    let mut written = Vec::new();
    for (artifact, staged_path) in staged {
        let Some(staged_path) = staged_path else {
            continue;
        };
        tokio::fs::rename(&staged_path, &artifact.path)
            .await
            .map_err(|err| SyncError::filesystem(&artifact.path, err))?;
        written.push(artifact.path.clone());
    }
    Ok(written)
}

/// Writes the preview story for a schema, skipping when unchanged.
pub async fn write_story(artifact: &Artifact) -> SyncResult<Option<PathBuf>> {
    match stage_artifact(artifact).await? {
        Some(staged) => {
            tokio::fs::rename(&staged, &artifact.path)
                .await
                .map_err(|err| SyncError::filesystem(&artifact.path, err))?;
            Ok(Some(artifact.path.clone()))
        }
        None => Ok(None),
    }
}

/// Best-effort removal of the artifact files paired with a registry name.
/// Missing files are success (deletion is idempotent); any other I/O error
/// propagates so callers can log it. Returns the paths actually removed.
pub fn remove_artifact_set(config: &SyncConfig, registry_name: &str) -> SyncResult<Vec<PathBuf>> {
    let pascal = to_pascal_case(registry_name);
    let targets = [
        config.stub_path(&pascal),
        config.type_path(&pascal),
        config.schema_path(&pascal),
        config.doc_path(&pascal),
        config.story_path(&pascal),
    ];

    let mut removed = Vec::new();
    for path in targets {
        match std::fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(SyncError::filesystem(&path, err)),
        }
    }
    Ok(removed)
}
