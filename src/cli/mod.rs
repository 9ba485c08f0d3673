use crate::config::{
    Config, VaultConfig, DEFAULT_BATCH_SIZE, DEFAULT_CONFIG_FILE, DEFAULT_LOG_LEVEL, DEFAULT_MOUNT,
    DEFAULT_SECRET_PATH, DEFAULT_SOURCE_ADDR, DEFAULT_TARGET_ADDR,
};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hvm", version, about = "Hashicorp Vault Migrator")]
pub struct Cli {
    /// Config file (YAML, JSON/JSON5 or TOML by extension).
    #[arg(short = 'f', long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config file from flags.
    Init(InitOpts),
    /// Copy and verify every secret under the configured path.
    Run(RunOpts),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
#[command(group(
    ArgGroup::new("source_auth")
        .required(true)
        .args(["source_token", "source_token_command"])
))]
#[command(group(
    ArgGroup::new("target_auth")
        .required(true)
        .args(["target_token", "target_token_command"])
))]
pub struct InitOpts {
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE, allow_negative_numbers = true)]
    pub batch_size: i64,
    #[arg(short = 'a', long, default_value = DEFAULT_SOURCE_ADDR)]
    pub source_vault_addr: String,
    #[arg(short = 'A', long, default_value = DEFAULT_TARGET_ADDR)]
    pub target_vault_addr: String,
    #[arg(short = 't', long)]
    pub source_token: Option<String>,
    #[arg(long)]
    pub source_token_command: Option<String>,
    #[arg(short = 'T', long)]
    pub target_token: Option<String>,
    #[arg(long)]
    pub target_token_command: Option<String>,
    #[arg(short = 'p', long, default_value = DEFAULT_SECRET_PATH)]
    pub source_secret_path: String,
    /// Destination path, if it differs from the source path.
    #[arg(short = 'P', long)]
    pub target_secret_path: Option<String>,
    #[arg(short = 'm', long, default_value = DEFAULT_MOUNT)]
    pub source_secret_mount: String,
    /// Destination mount, if it differs from the source mount.
    #[arg(short = 'M', long)]
    pub target_secret_mount: Option<String>,
    #[arg(long)]
    pub recursive: bool,
    #[arg(long)]
    pub fail_on_key_errors: bool,
    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

impl InitOpts {
    pub fn to_config(&self) -> Config {
        Config {
            batch_size: self.batch_size,
            fail_on_key_errors: self.fail_on_key_errors,
            recursive: self.recursive,
            src_vault: VaultConfig {
                addr: self.source_vault_addr.clone(),
                token: self.source_token.clone(),
                token_cmd: self.source_token_command.clone(),
                mount: Some(self.source_secret_mount.clone()),
                path: Some(self.source_secret_path.clone()),
                ..VaultConfig::default()
            },
            dest_vault: VaultConfig {
                addr: self.target_vault_addr.clone(),
                token: self.target_token.clone(),
                token_cmd: self.target_token_command.clone(),
                mount: self.target_secret_mount.clone(),
                path: self.target_secret_path.clone(),
                ..VaultConfig::default()
            },
        }
    }
}

#[derive(clap::Args)]
pub struct RunOpts {
    /// Print the final report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective config with tokens masked.
    Show,
    Validate,
}
