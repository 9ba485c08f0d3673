mod defaults;
mod io;
mod types;
mod validation;

pub use defaults::*;
pub use io::*;
pub use types::*;
pub use validation::*;

use crate::store::MountPath;
use crate::sync::SyncSettings;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Top-level migrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Fail the run when any key does not sync.
    #[serde(default)]
    pub fail_on_key_errors: bool,
    /// Descend into sub-folders of the source path.
    #[serde(default)]
    pub recursive: bool,
    pub src_vault: VaultConfig,
    pub dest_vault: VaultConfig,
}

fn default_batch_size() -> i64 {
    DEFAULT_BATCH_SIZE
}

impl Config {
    /// Load configuration from file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "Config file '{}' not found; create one with `hvm init`",
                path.display()
            );
        }

        info!("Loading config from {}", path.display());
        let mut config = read_config_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Write this configuration to `path`, format chosen by extension.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_config_file(path, self)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(size) = lookup(ENV_BATCH_SIZE) {
            match size.parse() {
                Ok(size) => self.batch_size = size,
                Err(_) => warn!("Ignoring {ENV_BATCH_SIZE}={size}: not an integer"),
            }
        }

        if let Some(token) = lookup(ENV_SRC_TOKEN).filter(|t| !t.is_empty()) {
            self.src_vault.apply_token(&token);
        }

        if let Some(token) = lookup(ENV_DEST_TOKEN).filter(|t| !t.is_empty()) {
            self.dest_vault.apply_token(&token);
        }
    }

    /// Source mount/path. Missing values fall back to the defaults.
    pub fn source_location(&self) -> MountPath {
        MountPath::new(
            non_empty(&self.src_vault.mount).unwrap_or(DEFAULT_MOUNT),
            non_empty(&self.src_vault.path).unwrap_or(""),
        )
    }

    /// Destination mount/path: the source location unless overridden.
    pub fn destination_location(&self) -> MountPath {
        let source = self.source_location();
        MountPath::new(
            non_empty(&self.dest_vault.mount).unwrap_or(source.mount.as_str()),
            non_empty(&self.dest_vault.path).unwrap_or(source.path.as_str()),
        )
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            batch_size: self.batch_size,
            source: self.source_location(),
            destination: self.destination_location(),
            recursive: self.recursive,
            fail_on_key_errors: self.fail_on_key_errors,
        }
    }

    /// Copy with literal tokens masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            src_vault: self.src_vault.redacted(),
            dest_vault: self.dest_vault.redacted(),
            ..self.clone()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            fail_on_key_errors: false,
            recursive: false,
            src_vault: VaultConfig::source_default(),
            dest_vault: VaultConfig::target_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn destination_defaults_to_source_location() {
        let mut config = Config::default();
        config.src_vault.mount = Some("kv".into());
        config.src_vault.path = Some("team/".into());

        assert_eq!(config.destination_location(), MountPath::new("kv", "team/"));

        config.dest_vault.path = Some("migrated/".into());
        assert_eq!(config.destination_location(), MountPath::new("kv", "migrated/"));

        config.dest_vault.mount = Some(String::new());
        assert_eq!(config.destination_location().mount, "kv");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config.src_vault.token_cmd = Some("vault print token".into());
        let env: HashMap<&str, &str> = [
            (ENV_BATCH_SIZE, "7"),
            (ENV_SRC_TOKEN, "hvs.from-env"),
            (ENV_DEST_TOKEN, ""),
        ]
        .into_iter()
        .collect();

        config.apply_overrides_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.batch_size, 7);
        assert_eq!(config.src_vault.token.as_deref(), Some("hvs.from-env"));
        assert!(config.src_vault.token_cmd.is_none());
        assert!(config.dest_vault.token.is_none());
    }

    #[test]
    fn bad_batch_size_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(|name| (name == ENV_BATCH_SIZE).then(|| "lots".to_string()));
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn redacted_masks_tokens() {
        let mut config = Config::default();
        config.src_vault.token = Some("hvs.CAESIverysecret".into());
        let shown = config.redacted();
        assert_eq!(shown.src_vault.token.as_deref(), Some("hv…et"));
        assert_eq!(shown.batch_size, config.batch_size);
    }

    #[test]
    fn settings_carry_policy_flags() {
        let mut config = Config::default();
        config.fail_on_key_errors = true;
        config.recursive = true;
        config.batch_size = 3;
        let settings = config.sync_settings();
        assert!(settings.fail_on_key_errors && settings.recursive);
        assert_eq!(settings.batch_size, 3);
        assert_eq!(settings.source.path, DEFAULT_SECRET_PATH);
    }
}
