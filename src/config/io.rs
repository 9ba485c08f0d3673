use super::Config;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Maximum size for a config file (10 MB).
pub const MAX_CONFIG_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// On-disk formats, picked by file extension. YAML is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") | Some("json5") => ConfigFormat::Json,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Parse a JSON5 configuration string (plain JSON is valid JSON5).
pub fn parse_config_json5(content: &str) -> Result<Config> {
    let config: Config = json5::from_str(content)?;
    Ok(config)
}

/// Parse configuration text in the given format.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<Config> {
    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Json => parse_config_json5(content)?,
    };
    Ok(config)
}

/// Read a configuration file, refusing anything over `MAX_CONFIG_FILE_BYTES`.
pub fn read_config_file(path: &Path) -> Result<Config> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot stat config file '{}'", path.display()))?;

    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Config file '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            metadata.len(),
            MAX_CONFIG_FILE_BYTES,
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    parse_config(&content, ConfigFormat::from_path(path))
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Write configuration to a file in the format implied by its extension.
pub fn write_config_file(path: &Path, config: &Config) -> Result<()> {
    let content = match ConfigFormat::from_path(path) {
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
