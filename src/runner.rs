//! Startup wiring: config → tokens → Vault clients → [`Syncer`].

use crate::config::{Config, VaultConfig};
use crate::error::SyncError;
use crate::infra::token::{TokenResolver, TokenSource};
use crate::store::{SecretStore, VaultClient, VaultEndpoint};
use crate::sync::{SyncReport, SyncReporter, Syncer, TracingReporter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

/// Endpoint settings checked, token not yet resolved.
struct PendingEndpoint<'a> {
    name: &'static str,
    address: Url,
    token: TokenSource,
    vault: &'a VaultConfig,
}

fn pending<'a>(name: &'static str, vault: &'a VaultConfig) -> Result<PendingEndpoint<'a>, SyncError> {
    let token = TokenSource::from_parts(name, vault.token.as_deref(), vault.token_cmd.as_deref())?;
    let address = Url::parse(&vault.addr)
        .map_err(|e| SyncError::InvalidConfig(format!("{name}.addr '{}': {e}", vault.addr)))?;
    Ok(PendingEndpoint {
        name,
        address,
        token,
        vault,
    })
}

async fn connect(
    pending: PendingEndpoint<'_>,
    resolver: &TokenResolver,
) -> Result<Arc<dyn SecretStore>, SyncError> {
    let token = resolver.resolve(&pending.token).await?;

    let mut endpoint =
        VaultEndpoint::new(pending.address, token).with_namespace(pending.vault.namespace.clone());
    if let Some(secs) = pending.vault.timeout_secs.filter(|s| *s > 0) {
        endpoint = endpoint.with_timeout(Duration::from_secs(secs));
    }

    let client = VaultClient::new(endpoint)?;
    info!(endpoint = pending.name, address = client.name(), "Vault client ready");
    Ok(Arc::new(client))
}

/// Build a [`Syncer`] from configuration.
///
/// Every configuration problem is reported before any token command runs,
/// and both tokens are resolved before any store is contacted.
pub async fn prepare(config: &Config, reporter: Arc<dyn SyncReporter>) -> Result<Syncer, SyncError> {
    if config.batch_size <= 0 {
        return Err(SyncError::InvalidBatchSize(config.batch_size));
    }

    let source = pending("srcVault", &config.src_vault)?;
    let destination = pending("destVault", &config.dest_vault)?;

    let resolver = TokenResolver::new();
    let source = connect(source, &resolver).await?;
    let destination = connect(destination, &resolver).await?;

    Syncer::new(config.sync_settings(), source, destination, reporter)
}

/// Prepare and run one sync with the default tracing reporter.
pub async fn run(config: &Config, cancel: CancellationToken) -> Result<SyncReport, SyncError> {
    let settings = config.sync_settings();
    info!(
        from = %settings.source,
        to = %settings.destination,
        batch_size = settings.batch_size,
        "Starting sync"
    );

    let reporter = Arc::new(TracingReporter::new(settings.source.mount.clone()));
    let syncer = prepare(config, reporter).await?;
    syncer.sync(cancel).await
}
