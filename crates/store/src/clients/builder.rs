//! Builder service client.
//!
//! The builder compiles and publishes an app from its file set. One call,
//! one receipt.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_id::AppId;
use crate::clients::create_default_client;
use crate::error::{Result, StoreError};

/// One file of an app source tree in the builder's wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderFile {
    /// Path relative to the app root, forward slashes.
    pub path: String,
    /// Base64-encoded file contents.
    pub content: String,
}

impl BuilderFile {
    pub fn new(path: impl Into<String>, data: &[u8]) -> Self {
        Self {
            path: path.into(),
            content: base64::engine::general_purpose::STANDARD.encode(data),
        }
    }
}

/// Outcome of a publish call. The message is human-readable status text,
/// passed through to the logs.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishReceipt {
    pub message: String,
}

#[async_trait]
pub trait BuilderClient: Send + Sync {
    /// Publish `app_id` from the given file set.
    async fn publish_app(&self, app_id: &AppId, files: &[BuilderFile]) -> Result<PublishReceipt>;
}

/// Builder client backed by the platform builder's HTTP API.
pub struct HttpBuilderClient {
    base_url: String,
    client: Client,
}

impl HttpBuilderClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            // Builds take a while; five minutes matches the service default.
            client: create_default_client(Duration::from_secs(300)),
        }
    }
}

#[async_trait]
impl BuilderClient for HttpBuilderClient {
    async fn publish_app(&self, app_id: &AppId, files: &[BuilderFile]) -> Result<PublishReceipt> {
        let url = format!("{}/builder/publish/{}", self.base_url, app_id);

        debug!("Publishing {} ({} files) via builder", app_id, files.len());

        let response = self
            .client
            .post(&url)
            .json(files)
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("Failed to publish {}: {}", app_id, e)))?;

        if !response.status().is_success() {
            return Err(StoreError::Network(format!(
                "Builder publish of {} failed with status {}",
                app_id,
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            StoreError::Network(format!(
                "Failed to parse builder response for {}: {}",
                app_id, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_file_encodes_content_as_base64() {
        let file = BuilderFile::new("store/blocks/home.json", b"{\"blocks\":[]}");
        assert_eq!(file.path, "store/blocks/home.json");
        assert_eq!(
            base64::engine::general_purpose::STANDARD
                .decode(&file.content)
                .unwrap(),
            b"{\"blocks\":[]}"
        );
    }
}
