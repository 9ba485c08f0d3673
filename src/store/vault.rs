//! HashiCorp Vault KV v2 store over the Vault HTTP API.

use super::{SecretDocument, SecretStore, StoreError, StoredSecret};
use crate::error::SyncError;
use crate::infra::token::Token;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default per-request timeout for Vault calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// One Vault instance plus the credential used against it.
#[derive(Debug, Clone)]
pub struct VaultEndpoint {
    pub address: Url,
    pub token: Token,
    pub namespace: Option<String>,
    pub timeout: Duration,
}

impl VaultEndpoint {
    pub fn new(address: Url, token: Token) -> Self {
        Self {
            address,
            token,
            namespace: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct VaultClient {
    endpoint: VaultEndpoint,
    display: String,
    client: Client,
}

impl VaultClient {
    pub fn new(endpoint: VaultEndpoint) -> Result<Self, SyncError> {
        let display = endpoint.address.as_str().trim_end_matches('/').to_string();
        if endpoint.address.cannot_be_a_base() {
            return Err(SyncError::InvalidConfig(format!(
                "'{display}' is not a usable Vault address"
            )));
        }
        let client = Client::builder()
            .timeout(endpoint.timeout)
            .build()
            .map_err(|source| SyncError::ClientInit {
                address: display.clone(),
                source,
            })?;
        Ok(Self {
            endpoint,
            display,
            client,
        })
    }

    /// `{addr}/v1/{mount}/{section}/{path}` where section is `data` or `metadata`.
    ///
    /// Each `/`-separated segment of `mount` and `path` is percent-encoded, so
    /// a key such as `db#prod` stays one path segment. A trailing `/` on
    /// `path` is kept, and an empty `path` addresses `{section}/` itself.
    fn api_url(&self, mount: &str, section: &str, path: &str) -> Url {
        let mut url = self.endpoint.address.clone();
        // `new` rejects addresses that cannot be a base.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("v1");
            segments.extend(mount.split('/').filter(|s| !s.is_empty()));
            segments.push(section);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if path.is_empty() || path.ends_with('/') {
                segments.push("");
            }
        }
        url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("X-Vault-Token", self.endpoint.token.expose());
        match &self.endpoint.namespace {
            Some(namespace) => builder.header("X-Vault-Namespace", namespace),
            None => builder,
        }
    }

    async fn error_for_status(response: Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Status { status, body }
    }
}

// ============================================================================
// Vault API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Option<ListData>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    keys: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    data: ReadEnvelope,
}

#[derive(Debug, Deserialize)]
struct ReadEnvelope {
    data: Option<SecretDocument>,
    #[serde(default)]
    metadata: Option<VersionMetadata>,
}

#[derive(Debug, Deserialize)]
struct VersionMetadata {
    #[serde(default)]
    version: Option<u64>,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    data: &'a SecretDocument,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    data: Option<VersionMetadata>,
}

// ============================================================================
// SecretStore Implementation
// ============================================================================

#[async_trait]
impl SecretStore for VaultClient {
    async fn list(&self, mount: &str, path: &str) -> Result<Vec<String>, StoreError> {
        let url = self.api_url(mount, "metadata", path);
        debug!(store = %self.display, %url, "Listing keys");

        let response = self
            .authorize(self.client.get(url).query(&[("list", "true")]))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => {
                let body = response.text().await?;
                let parsed: ListResponse = serde_json::from_str(&body)
                    .map_err(|e| StoreError::Decode(format!("key list: {e}")))?;
                Ok(parsed.data.and_then(|d| d.keys).unwrap_or_default())
            }
            _ => Err(Self::error_for_status(response).await),
        }
    }

    async fn read(&self, mount: &str, path: &str) -> Result<StoredSecret, StoreError> {
        let url = self.api_url(mount, "data", path);
        debug!(store = %self.display, %url, "Reading secret");

        let response = self.authorize(self.client.get(url)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(format!("{mount}/{path}"))),
            status if status.is_success() => {
                let body = response.text().await?;
                let parsed: ReadResponse = serde_json::from_str(&body)
                    .map_err(|e| StoreError::Decode(format!("secret {mount}/{path}: {e}")))?;
                // Vault answers 200 with `data: null` for a deleted current version.
                let document = parsed
                    .data
                    .data
                    .ok_or_else(|| StoreError::NotFound(format!("{mount}/{path}")))?;
                Ok(StoredSecret {
                    document,
                    version: parsed.data.metadata.and_then(|m| m.version),
                })
            }
            _ => Err(Self::error_for_status(response).await),
        }
    }

    async fn write(
        &self,
        mount: &str,
        path: &str,
        document: &SecretDocument,
    ) -> Result<Option<u64>, StoreError> {
        let url = self.api_url(mount, "data", path);
        debug!(store = %self.display, %url, "Writing secret");

        let response = self
            .authorize(self.client.post(url))
            .json(&WriteRequest { data: document })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let parsed: WriteResponse = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("write response for {mount}/{path}: {e}")))?;
        Ok(parsed.data.and_then(|m| m.version))
    }

    fn name(&self) -> &str {
        &self.display
    }
}
