//! Webhook event processing.
//!
//! Verifies the change-notification signature, classifies the event, and
//! dispatches regeneration, deletion, token re-extraction, or downstream
//! builds. Delivery is at-least-once and possibly out of order, so every
//! handler is safe to run twice with the same payload: regeneration
//! overwrites, and deleting an already-absent file is success.

use crate::config::SyncConfig;
use crate::deploy;
use crate::design_tool::DesignToolClient;
use crate::error::{SyncError, SyncResult};
use crate::generator;
use crate::model::{
    ComponentSchema, StoryRef, WebhookAction, WebhookPayload, WebhookSubject,
};
use crate::state::AppState;
use crate::tokens::{self, TokenStore};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Content types whose stories carry design-system source material.
const DESIGN_SYSTEM_CONTENT_TYPES: &[&str] =
    &["design-token", "component-library", "style-guide"];

/// Response body returned to the registry.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub success: bool,
    pub message: String,
}

impl WebhookAck {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Verifies the HMAC-SHA1 signature of the raw body against the shared
/// secret. When no secret is configured, verification is skipped with a
/// warning. This is an explicit insecure-by-default fallback for local setups.
pub fn verify_signature(
    secret: Option<&str>,
    body: &[u8],
    signature: Option<&str>,
) -> SyncResult<()> {
    let Some(secret) = secret else {
        tracing::warn!("no webhook secret configured, skipping signature verification");
        return Ok(());
    };
    let Some(signature) = signature else {
        return Err(SyncError::SignatureInvalid);
    };

    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|_| SyncError::SignatureInvalid)?;
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    let mut expected = String::with_capacity(digest.len() * 2);
    for b in digest {
        expected.push_str(&format!("{b:02x}"));
    }

    if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
        Ok(())
    } else {
        Err(SyncError::SignatureInvalid)
    }
}

pub struct WebhookProcessor {
    state: Arc<AppState>,
}

impl WebhookProcessor {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn config(&self) -> &SyncConfig {
        &self.state.config
    }

    /// Verifies, classifies, and dispatches one delivery. The signature is
    /// checked before the payload is even parsed; a mismatch never touches
    /// any file.
    pub async fn handle(&self, raw_body: &[u8], signature: Option<&str>) -> SyncResult<WebhookAck> {
        verify_signature(self.config().webhook_secret.as_deref(), raw_body, signature)?;

        let payload: WebhookPayload = serde_json::from_slice(raw_body)
            .map_err(|err| SyncError::InvalidPayload(err.to_string()))?;
        let (subject, action) = payload.classify();
        tracing::info!(subject = %subject, action = %action, "processing webhook event");

        match (&subject, &action) {
            (WebhookSubject::Component, WebhookAction::Created | WebhookAction::Updated) => {
                let Some(component) = payload.component.as_ref() else {
                    return Err(SyncError::InvalidPayload(
                        "component event without component envelope".to_string(),
                    ));
                };
                self.regenerate_component(component).await?;
                self.maybe_deploy().await;
                Ok(WebhookAck::ok(format!("regenerated {}", component.name)))
            }
            (WebhookSubject::Component, WebhookAction::Deleted) => {
                let Some(component) = payload.component.as_ref() else {
                    return Err(SyncError::InvalidPayload(
                        "component event without component envelope".to_string(),
                    ));
                };
                self.delete_component(&component.name).await?;
                self.maybe_deploy().await;
                Ok(WebhookAck::ok(format!("removed {}", component.name)))
            }
            (WebhookSubject::Story, WebhookAction::Published | WebhookAction::Updated) => {
                let story = payload.story.as_ref();
                if story.is_some_and(is_design_system_story) {
                    self.resync_tokens().await;
                }
                self.maybe_deploy().await;
                Ok(WebhookAck::ok("story change processed"))
            }
            (WebhookSubject::Story, WebhookAction::Deleted) => {
                if let Some(story) = payload.story.as_ref() {
                    self.cleanup_story(story);
                }
                self.maybe_deploy().await;
                Ok(WebhookAck::ok("story removal processed"))
            }
            (WebhookSubject::Datasource, WebhookAction::EntriesUpdated) => {
                self.maybe_deploy().await;
                Ok(WebhookAck::ok("datasource update processed"))
            }
            _ => {
                tracing::info!(subject = %subject, action = %action, "unhandled webhook event");
                Ok(WebhookAck::ok("event ignored"))
            }
        }
    }

    /// Regenerates the full artifact set for one component. Overwrites are
    /// whole-file, so redelivery converges to the same on-disk state.
    async fn regenerate_component(&self, component: &ComponentSchema) -> SyncResult<()> {
        let _guard = self.state.subject_locks.acquire(&component.name).await;

        let set = generator::generate(self.config(), component);
        let written = generator::write_set(&set).await?;
        tracing::info!(
            component = %component.name,
            files = written.len(),
            "artifact set regenerated"
        );

        if self.config().auto_create_stories {
            let story = generator::generate_story(self.config(), component);
            generator::write_story(&story).await?;
        }
        Ok(())
    }

    /// Removes the paired artifact files. Missing files are not errors:
    /// deleting a component that was never generated is a no-op success.
    async fn delete_component(&self, name: &str) -> SyncResult<()> {
        let _guard = self.state.subject_locks.acquire(name).await;

        let removed = generator::remove_artifact_set(self.config(), name)?;
        if removed.is_empty() {
            tracing::info!(component = %name, "no artifacts to remove");
        } else {
            for path in &removed {
                tracing::info!(path = %path.display(), "removed artifact");
            }
        }
        Ok(())
    }

    /// Re-extracts tokens from the design tool and merges them into the
    /// store. Failures here are logged, not returned: token sync dying
    /// must not fail the delivery that triggered it.
    async fn resync_tokens(&self) {
        if !self.config().has_design_tool() {
            tracing::warn!("design tool not configured, skipping token re-extraction");
            return;
        }
        let _guard = self.state.subject_locks.acquire("design-tokens").await;

        let result: SyncResult<()> = async {
            let client = DesignToolClient::new(self.config())?;
            let (file, styles) = tokio::try_join!(client.fetch_file(), client.fetch_styles())?;
            let extracted = tokens::extract(&file.document, &styles);
            let store = TokenStore::new(&self.config().tokens_file);
            let merged = store.merge_and_save(extracted)?;
            tracing::info!(counts = ?merged.counts(), "design tokens re-extracted");
            Ok(())
        }
        .await;

        if let Err(err) = result {
            tracing::error!(category = err.category(), %err, "token re-extraction failed");
        }
    }

    /// Best-effort cleanup for a deleted story: a preview fixture named
    /// after the slug is removed if present.
    fn cleanup_story(&self, story: &StoryRef) {
        let Some(slug) = story.slug.as_deref().or(story.name.as_deref()) else {
            return;
        };
        let pascal = generator::to_pascal_case(slug);
        let path = self.config().story_path(&pascal);
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::info!(path = %path.display(), "removed preview story"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(path = %path.display(), %err, "story cleanup failed"),
        }
    }

    async fn maybe_deploy(&self) {
        if self.config().auto_deploy {
            deploy::trigger_downstream(self.config()).await;
        }
    }
}

fn is_design_system_story(story: &StoryRef) -> bool {
    story
        .content_type
        .as_deref()
        .is_some_and(|ct| DESIGN_SYSTEM_CONTENT_TYPES.contains(&ct))
}
