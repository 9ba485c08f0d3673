//! Ctrl-C / SIGTERM handling for a sync run.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawn a listener that cancels `cancel` on Ctrl-C or SIGTERM.
///
/// The listener exits quietly once `cancel` fires for any other reason.
pub fn cancel_on_shutdown_signal(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => {
                warn!("Stopping after the current batch; in-flight calls are being aborted");
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
