//! Schema registry client.
//!
//! Read-only access to the registry's component catalogue. Any transport
//! or auth failure maps to [`SyncError::RegistryUnavailable`], which
//! callers treat as fatal for the whole generation run, since a partial schema
//! list is never trusted. Retries, if any, belong to the caller.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::model::ComponentSchema;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: String,
    space_id: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ComponentListResponse {
    components: Vec<ComponentSchema>,
}

impl RegistryClient {
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| {
                SyncError::RegistryUnavailable(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            base_url: config.registry_base_url.trim_end_matches('/').to_string(),
            space_id: config.registry_space_id.clone(),
            token: config.registry_management_token.clone(),
            client,
        })
    }

    /// Fetches every component schema in the configured space.
    pub async fn fetch_all_components(&self) -> SyncResult<Vec<ComponentSchema>> {
        let url = format!("{}/spaces/{}/components", self.base_url, self.space_id);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.token)
            .send()
            .await
            .map_err(|err| SyncError::RegistryUnavailable(format!("request failed: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::RegistryUnavailable(format!(
                "registry API error ({status}): {body}"
            )));
        }

        let body: ComponentListResponse = resp
            .json()
            .await
            .map_err(|err| SyncError::RegistryUnavailable(format!("parse response: {err}")))?;
        Ok(body.components)
    }

    /// Fetches a single component schema by registry name.
    pub async fn fetch_component(&self, name: &str) -> SyncResult<Option<ComponentSchema>> {
        let components = self.fetch_all_components().await?;
        Ok(components.into_iter().find(|c| c.name == name))
    }
}
