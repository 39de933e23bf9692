//! Downstream triggers: the deployment build hook and the external
//! visual-regression publish command. Both are fire-and-forget: success
//! is an HTTP 2xx or a zero exit status, and failures are logged, never
//! propagated into the run that triggered them.

use crate::config::SyncConfig;
use anyhow::{Context, Result};
use tokio::process::Command;

/// Fires every configured downstream trigger, logging each outcome.
pub async fn trigger_downstream(config: &SyncConfig) {
    if let Err(err) = trigger_build(config).await {
        tracing::warn!(%err, "build hook trigger failed");
    }
    if let Err(err) = publish_previews(config).await {
        tracing::warn!(%err, "preview publish failed");
    }
}

/// POSTs the build hook with no body. A missing hook is a quiet no-op.
pub async fn trigger_build(config: &SyncConfig) -> Result<()> {
    let Some(hook) = config.build_hook_url.as_deref() else {
        tracing::debug!("no build hook configured");
        return Ok(());
    };

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("failed to build HTTP client")?;

    let resp = client
        .post(hook)
        .send()
        .await
        .context("build hook request failed")?;
    anyhow::ensure!(
        resp.status().is_success(),
        "build hook returned {}",
        resp.status()
    );
    tracing::info!("downstream build triggered");
    Ok(())
}

/// Runs the configured visual-regression publish command through the
/// shell. Success is exit status zero.
pub async fn publish_previews(config: &SyncConfig) -> Result<()> {
    let Some(command) = config.publish_command.as_deref() else {
        tracing::debug!("no publish command configured");
        return Ok(());
    };

    tracing::info!(%command, "publishing previews");
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .await
        .context("failed to spawn publish command")?;
    anyhow::ensure!(status.success(), "publish command exited with {status}");
    Ok(())
}
