use super::defaults::{DEFAULT_MOUNT, DEFAULT_SECRET_PATH, DEFAULT_SOURCE_ADDR, DEFAULT_TARGET_ADDR};
use crate::infra::token::redact_secret;
use serde::{Deserialize, Serialize};

// ============================================================================
// Vault Endpoint Configuration
// ============================================================================

/// One side of the migration as written in the config file.
///
/// `token` and `tokenCmd` are mutually exclusive. On the destination side
/// `mount` and `path` are optional overrides of the source values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    #[serde(default)]
    pub addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl VaultConfig {
    pub fn source_default() -> Self {
        Self {
            addr: DEFAULT_SOURCE_ADDR.to_string(),
            mount: Some(DEFAULT_MOUNT.to_string()),
            path: Some(DEFAULT_SECRET_PATH.to_string()),
            ..Self::default()
        }
    }

    pub fn target_default() -> Self {
        Self {
            addr: DEFAULT_TARGET_ADDR.to_string(),
            ..Self::default()
        }
    }

    /// Replace the token with a literal, clearing any token command.
    pub fn apply_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
        self.token_cmd = None;
    }

    pub(super) fn redacted(&self) -> Self {
        Self {
            token: self.token.as_deref().map(redact_secret),
            ..self.clone()
        }
    }
}

/// Mount or path value, treating empty strings as unset.
pub(super) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
