use super::{Config, VaultConfig};
use anyhow::Result;
use url::Url;

/// Validation errors for configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.batch_size <= 0 {
        errors.push(ConfigValidationError {
            path: "batchSize".to_string(),
            message: "Batch size must be greater than 0".to_string(),
        });
    }

    validate_vault("srcVault", &config.src_vault, &mut errors);
    validate_vault("destVault", &config.dest_vault, &mut errors);

    errors
}

fn validate_vault(name: &str, vault: &VaultConfig, errors: &mut Vec<ConfigValidationError>) {
    match Url::parse(&vault.addr) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ConfigValidationError {
            path: format!("{name}.addr"),
            message: format!("Unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ConfigValidationError {
            path: format!("{name}.addr"),
            message: format!("Invalid address '{}': {e}", vault.addr),
        }),
    }

    let has_token = vault.token.as_deref().is_some_and(|t| !t.is_empty());
    let has_cmd = vault.token_cmd.as_deref().is_some_and(|c| !c.trim().is_empty());
    match (has_token, has_cmd) {
        (true, true) => errors.push(ConfigValidationError {
            path: format!("{name}.token"),
            message: "token and tokenCmd are mutually exclusive".to_string(),
        }),
        (false, false) => errors.push(ConfigValidationError {
            path: format!("{name}.token"),
            message: "Either token or tokenCmd is required".to_string(),
        }),
        _ => {}
    }

    if vault.timeout_secs == Some(0) {
        errors.push(ConfigValidationError {
            path: format!("{name}.timeoutSecs"),
            message: "Timeout must be greater than 0".to_string(),
        });
    }
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}
