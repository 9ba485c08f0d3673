mod vault;

pub use vault::*;

use async_trait::async_trait;
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Store Types
// ============================================================================

/// The field/value content of one secret. Values may nest arbitrarily.
pub type SecretDocument = serde_json::Map<String, serde_json::Value>;

/// A secret's current version as returned by a read.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSecret {
    pub document: SecretDocument,
    pub version: Option<u64>,
}

/// A mount plus a key prefix inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountPath {
    pub mount: String,
    pub path: String,
}

impl MountPath {
    pub fn new(mount: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
            path: path.into(),
        }
    }

    /// Full secret path of `key` under this prefix, joined by a single `/`.
    pub fn secret_path(&self, key: &str) -> String {
        let prefix = self.path.trim_matches('/');
        let key = key.trim_start_matches('/');
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}/{key}")
        }
    }
}

impl std::fmt::Display for MountPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.mount, self.path)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("secret not found: {0}")]
    NotFound(String),
    #[error("cancelled")]
    Cancelled,
}

// ============================================================================
// Store Trait
// ============================================================================

/// A KV secret store addressed by mount + path.
///
/// Implementations are shared across every worker of a batch, so they must
/// tolerate concurrent calls.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Keys directly under `path`. Folder entries end with `/`.
    /// A path with nothing under it yields an empty list.
    async fn list(&self, mount: &str, path: &str) -> Result<Vec<String>, StoreError>;

    async fn read(&self, mount: &str, path: &str) -> Result<StoredSecret, StoreError>;

    /// Replace the secret at `path` with `document`. Returns the new version
    /// when the store reports one.
    async fn write(
        &self,
        mount: &str,
        path: &str,
        document: &SecretDocument,
    ) -> Result<Option<u64>, StoreError>;

    /// Display name for logging.
    fn name(&self) -> &str;
}

/// Race a store call against the run's cancellation signal.
///
/// If `cancel` fires first the call is dropped, which aborts any pending
/// network I/O, and [`StoreError::Cancelled`] is returned.
pub async fn with_cancel<T, F>(cancel: &CancellationToken, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        result = call => result,
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
    }
}
