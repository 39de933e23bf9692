//! Design token extraction and persistence.
//!
//! Walks the design document tree, matches style definitions to the first
//! node that references them (depth-first, document order), and reduces
//! them to a flat [`TokenMap`]. Extraction is best-effort per style: a
//! failing style is warned about and skipped, never aborting the sync.

use crate::design_tool::{DocumentNode, StyleRef};
use crate::error::{SyncError, SyncResult};
use crate::model::{TokenMap, TypographyToken};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

static SPACING_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)spacing|space|gap").expect("spacing pattern valid")
});
static RADIUS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)radius|corner|rounded").expect("radius pattern valid")
});

/// Reduces a document tree plus style catalogue to a flat token map.
pub fn extract(document: &DocumentNode, styles: &[StyleRef]) -> TokenMap {
    let mut tokens = TokenMap::default();

    for style in styles {
        match style.style_type.as_str() {
            "FILL" => match extract_color(document, style) {
                Some(value) => {
                    tokens.colors.insert(sanitize_token_name(&style.name), value);
                }
                None => {
                    tracing::warn!(style = %style.name, "could not extract color token, skipping");
                }
            },
            "TEXT" => match extract_typography(document, style) {
                Some(value) => {
                    tokens
                        .typography
                        .insert(sanitize_token_name(&style.name), value);
                }
                None => {
                    tracing::warn!(style = %style.name, "could not extract text token, skipping");
                }
            },
            "EFFECT" => match extract_shadow(document, style) {
                Some(value) => {
                    tokens
                        .shadows
                        .insert(sanitize_token_name(&style.name), value);
                }
                None => {
                    tracing::warn!(style = %style.name, "could not extract shadow token, skipping");
                }
            },
            other => {
                tracing::debug!(style = %style.name, style_type = other, "ignoring style type");
            }
        }
    }

    // Spacing and radius tokens have no style catalogue entries; they are
    // inferred by name-pattern match over arbitrary nodes. Best-effort;
    // may miss or over-match.
    extract_spacing(document, &mut tokens);
    extract_radii(document, &mut tokens);

    tokens
}

fn extract_color(document: &DocumentNode, style: &StyleRef) -> Option<String> {
    let node = find_node_by_style_key(document, &style.key)?;
    let fill = node.fills.first()?;
    if fill.kind != "SOLID" {
        return None;
    }
    let color = fill.color?;
    Some(rgba_to_hex(color.r, color.g, color.b, color.a))
}

fn extract_typography(document: &DocumentNode, style: &StyleRef) -> Option<TypographyToken> {
    let node = find_node_by_style_key(document, &style.key)?;
    let text = node.style.as_ref()?;

    Some(TypographyToken {
        font_family: text
            .font_family
            .clone()
            .unwrap_or_else(|| "inherit".to_string()),
        font_size: format!("{}px", text.font_size.unwrap_or(16.0)),
        font_weight: text.font_weight.unwrap_or(400.0) as u32,
        line_height: px_or_normal(text.line_height_px),
        letter_spacing: px_or_normal(text.letter_spacing),
    })
}

fn extract_shadow(document: &DocumentNode, style: &StyleRef) -> Option<String> {
    let node = find_node_by_style_key(document, &style.key)?;
    let effect = node.effects.iter().find(|e| e.kind == "DROP_SHADOW")?;
    let offset = effect.offset?;
    let radius = effect.radius.unwrap_or(0.0);
    let color = effect.color?;

    let channel = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    Some(format!(
        "{}px {}px {}px rgba({}, {}, {}, {})",
        offset.x,
        offset.y,
        radius,
        channel(color.r),
        channel(color.g),
        channel(color.b),
        color.a,
    ))
}

fn extract_spacing(document: &DocumentNode, tokens: &mut TokenMap) {
    let mut nodes = Vec::new();
    find_nodes_by_name(document, &SPACING_NAME, &mut nodes);
    for node in nodes {
        if let (Some(name), Some(bounds)) = (node.name.as_deref(), node.absolute_bounding_box) {
            let size = bounds.width.max(bounds.height);
            tokens
                .spacing
                .insert(sanitize_token_name(name), format!("{size}px"));
        }
    }
}

fn extract_radii(document: &DocumentNode, tokens: &mut TokenMap) {
    let mut nodes = Vec::new();
    find_nodes_by_name(document, &RADIUS_NAME, &mut nodes);
    for node in nodes {
        if let (Some(name), Some(radius)) = (node.name.as_deref(), node.corner_radius) {
            tokens
                .border_radius
                .insert(sanitize_token_name(name), format!("{radius}px"));
        }
    }
}

/// Depth-first search for the first node whose style-slot map references
/// the given style key. First match in document order governs when several
/// nodes reference the same style.
fn find_node_by_style_key<'a>(node: &'a DocumentNode, key: &str) -> Option<&'a DocumentNode> {
    if node.styles.values().any(|v| v == key) {
        return Some(node);
    }
    node.children
        .iter()
        .find_map(|child| find_node_by_style_key(child, key))
}

fn find_nodes_by_name<'a>(node: &'a DocumentNode, pattern: &Regex, out: &mut Vec<&'a DocumentNode>) {
    if let Some(name) = node.name.as_deref() {
        if pattern.is_match(name) {
            out.push(node);
        }
    }
    for child in &node.children {
        find_nodes_by_name(child, pattern, out);
    }
}

/// `#rrggbb`, with a 2-digit alpha suffix only when alpha < 1.
pub fn rgba_to_hex(r: f64, g: f64, b: f64, a: f64) -> String {
    let to_hex = |c: f64| format!("{:02x}", (c * 255.0).round().clamp(0.0, 255.0) as u8);
    let mut hex = format!("#{}{}{}", to_hex(r), to_hex(g), to_hex(b));
    if a < 1.0 {
        hex.push_str(&to_hex(a));
    }
    hex
}

/// Lower-case, non-alphanumeric runs collapsed to a single `-`,
/// leading/trailing `-` trimmed.
pub fn sanitize_token_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(lower);
        } else {
            pending_dash = true;
        }
    }
    out
}

fn px_or_normal(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 => format!("{v}px"),
        _ => "normal".to_string(),
    }
}

// =============================================================================
// Token store
// =============================================================================

/// On-disk token map. Reloaded fresh each run; replaced wholesale on save.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored map. A missing file yields an empty map; a corrupt
    /// file is warned about and treated as empty (the next save replaces
    /// it wholesale).
    pub fn load(&self) -> SyncResult<TokenMap> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(TokenMap::default());
            }
            Err(err) => return Err(SyncError::filesystem(&self.path, err)),
        };
        match serde_json::from_str(&contents) {
            Ok(map) => Ok(map),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "token store unreadable, starting fresh");
                Ok(TokenMap::default())
            }
        }
    }

    /// Merges `newer` into the stored map (shallow per category) and
    /// writes the result atomically.
    pub fn merge_and_save(&self, newer: TokenMap) -> SyncResult<TokenMap> {
        let mut merged = self.load()?;
        merged.merge_from(newer);
        self.save(&merged)?;
        Ok(merged)
    }

    pub fn save(&self, map: &TokenMap) -> SyncResult<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|err| SyncError::filesystem(parent, err))?;

        let json = serde_json::to_string_pretty(map)
            .map_err(|err| SyncError::extraction("token-store", err))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|err| SyncError::filesystem(parent, err))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .map_err(|err| SyncError::filesystem(&self.path, err))?;
        tmp.persist(&self.path)
            .map_err(|err| SyncError::filesystem(&self.path, err.error))?;
        Ok(())
    }
}
