//! Object storage client
//!
//! The worker never talks to the bucket directly; the storage gateway owns
//! the credentials and issues time-limited signed URLs. This module defines
//! the seam (`AudioObjectStore`) and the HTTP gateway implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::StorageConfig;

/// Error types for object storage operations
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Gateway URL not configured for this process
    MissingConfiguration(String),
    /// Request failed (network, timeout, non-success status)
    RequestFailed(String),
    /// Gateway returned a payload we could not use
    InvalidResponse(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::MissingConfiguration(msg) => write!(f, "Storage not configured: {}", msg),
            StorageError::RequestFailed(msg) => write!(f, "Storage request failed: {}", msg),
            StorageError::InvalidResponse(msg) => write!(f, "Invalid storage response: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// The storage operations the pipelines and retention sweep depend on
#[async_trait]
pub trait AudioObjectStore: Send + Sync {
    /// Produce a short-lived signed download URL for an audio object
    async fn presign_download(&self, object_key: &str) -> Result<String, StorageError>;

    /// Delete an audio object
    async fn delete_object(&self, object_key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresignRequest<'a> {
    key: &'a str,
    expires_sec: u64,
}

#[derive(Debug, Deserialize)]
struct PresignResponse {
    url: String,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    key: &'a str,
}

/// HTTP client for the deployment's storage gateway
pub struct StorageGatewayClient {
    config: StorageConfig,
    client: reqwest::Client,
}

impl StorageGatewayClient {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Gateway base URL, or a configuration error when first used
    fn gateway_url(&self) -> Result<&str, StorageError> {
        self.config
            .gateway_url
            .as_deref()
            .ok_or_else(|| StorageError::MissingConfiguration(
                "Set STORAGE_GATEWAY_URL to presign or delete audio objects".to_string(),
            ))
    }

    fn request(&self, url: String) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url);
        if let Some(token) = &self.config.gateway_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}

#[async_trait]
impl AudioObjectStore for StorageGatewayClient {
    async fn presign_download(&self, object_key: &str) -> Result<String, StorageError> {
        let base = self.gateway_url()?;
        let url = format!("{}/presign-download", base.trim_end_matches('/'));

        let response = self
            .request(url)
            .json(&PresignRequest {
                key: object_key,
                expires_sec: self.config.signed_download_expires_sec,
            })
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(format!("presign-download: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::RequestFailed(format!(
                "presign-download: {} {}", status, body
            )));
        }

        let payload: PresignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("presign-download: {}", e)))?;

        Ok(payload.url)
    }

    async fn delete_object(&self, object_key: &str) -> Result<(), StorageError> {
        let base = self.gateway_url()?;
        let url = format!("{}/delete-object", base.trim_end_matches('/'));

        let response = self
            .request(url)
            .json(&DeleteRequest { key: object_key })
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(format!("delete-object: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::RequestFailed(format!(
                "delete-object: {} {}", status, body
            )));
        }

        Ok(())
    }
}
