use anyhow::{bail, Context};
use clap::Parser;
use hvm::cli::{Cli, Commands, ConfigAction};
use hvm::config::{validate_config_object, Config};
use hvm::{infra, logging, runner};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_json);

    match cli.command {
        Commands::Init(opts) => {
            if cli.config_file.exists() && !opts.force {
                bail!(
                    "Config file '{}' already exists; pass --force to overwrite",
                    cli.config_file.display()
                );
            }
            let config = opts.to_config();
            validate_config_object(&config)?;
            config.write(&cli.config_file)?;
            info!("Configuration written to {}", cli.config_file.display());
        }
        Commands::Run(opts) => {
            let config = Config::load(&cli.config_file)?;
            validate_config_object(&config)?;

            let cancel = CancellationToken::new();
            let signals = infra::shutdown::cancel_on_shutdown_signal(cancel.clone());
            let result = runner::run(&config, cancel.clone()).await;
            cancel.cancel();
            signals.abort();

            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    let category = e.category();
                    error!(?category, code = e.code(), "{e}");
                    return Err(e).with_context(|| format!("{category:?} error"));
                }
            };

            for line in report.summary_lines() {
                println!("{line}");
            }
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            if report.cancelled {
                bail!("Run cancelled before all batches were dispatched");
            }
        }
        Commands::Config(opts) => {
            let config = Config::load(&cli.config_file)?;
            match opts.action {
                ConfigAction::Show => {
                    print!("{}", serde_yaml::to_string(&config.redacted())?);
                }
                ConfigAction::Validate => {
                    validate_config_object(&config)?;
                    println!("Configuration is valid");
                }
            }
        }
        Commands::Version => {
            println!("hvm {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
