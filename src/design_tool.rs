//! Design-tool API client and wire types.
//!
//! Fetches the document tree and the style catalogue that the token
//! extractor walks. Failures here are fatal to token sync only; the rest
//! of the pipeline proceeds without fresh tokens.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DesignToolClient {
    base_url: String,
    file_key: String,
    token: String,
    client: reqwest::Client,
}

impl DesignToolClient {
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| {
                SyncError::DesignToolUnavailable(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            base_url: config.design_tool_base_url.trim_end_matches('/').to_string(),
            file_key: config.design_tool_file_key.clone(),
            token: config.design_tool_token.clone(),
            client,
        })
    }

    /// Fetches the full document tree for the configured file.
    pub async fn fetch_file(&self) -> SyncResult<DocumentFile> {
        self.get_json(&format!("{}/files/{}", self.base_url, self.file_key))
            .await
    }

    /// Fetches the style catalogue (fills, text styles, effects).
    pub async fn fetch_styles(&self) -> SyncResult<Vec<StyleRef>> {
        let catalogue: StyleCatalogue = self
            .get_json(&format!("{}/files/{}/styles", self.base_url, self.file_key))
            .await?;
        Ok(catalogue.meta.styles)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> SyncResult<T> {
        let resp = self
            .client
            .get(url)
            .header("X-Design-Token", &self.token)
            .send()
            .await
            .map_err(|err| SyncError::DesignToolUnavailable(format!("request failed: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::DesignToolUnavailable(format!(
                "design tool API error ({status}): {body}"
            )));
        }

        resp.json()
            .await
            .map_err(|err| SyncError::DesignToolUnavailable(format!("parse response: {err}")))
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct StyleCatalogue {
    pub meta: StyleMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyleMeta {
    #[serde(default)]
    pub styles: Vec<StyleRef>,
}

/// One entry of the style catalogue. `key` is what document nodes
/// reference from their `styles` slot map.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleRef {
    pub key: String,
    pub name: String,
    pub style_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentFile {
    pub document: DocumentNode,
}

/// A node of the design document tree. Only the attributes the extractor
/// reads are modeled; everything else is ignored on deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    #[serde(default)]
    pub name: Option<String>,
    /// Style-slot map: slot name (fill, text, effect) to style key.
    #[serde(default)]
    pub styles: HashMap<String, String>,
    #[serde(default)]
    pub fills: Vec<Paint>,
    #[serde(default)]
    pub style: Option<TextAttributes>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub absolute_bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub corner_radius: Option<f64>,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub color: Option<Rgba>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAttributes {
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_weight: Option<f64>,
    #[serde(default)]
    pub line_height_px: Option<f64>,
    #[serde(default)]
    pub letter_spacing: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Effect {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub offset: Option<Vec2>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub color: Option<Rgba>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}
