use super::digest::document_digest;
use super::outcome::{OutcomeKind, SyncOutcome};
use super::reporter::SyncReporter;
use crate::store::{with_cancel, MountPath, SecretStore};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Copies a single key from source to destination and verifies the copy.
///
/// Steps run strictly in order: source read, destination write, destination
/// read-back, digest comparison. The first failing step decides the outcome
/// and nothing after it runs. A failed verification does not roll the write
/// back.
pub struct SyncWorker {
    source: Arc<dyn SecretStore>,
    destination: Arc<dyn SecretStore>,
    from: MountPath,
    to: MountPath,
    reporter: Arc<dyn SyncReporter>,
}

impl SyncWorker {
    pub fn new(
        source: Arc<dyn SecretStore>,
        destination: Arc<dyn SecretStore>,
        from: MountPath,
        to: MountPath,
        reporter: Arc<dyn SyncReporter>,
    ) -> Self {
        Self {
            source,
            destination,
            from,
            to,
            reporter,
        }
    }

    pub async fn sync(&self, cancel: &CancellationToken, key: &str) -> SyncOutcome {
        let outcome = self.copy_and_verify(cancel, key).await;
        self.reporter.key_finished(&outcome);
        outcome
    }

    async fn copy_and_verify(&self, cancel: &CancellationToken, key: &str) -> SyncOutcome {
        let source_path = self.from.secret_path(key);
        let destination_path = self.to.secret_path(key);

        debug!(secret = %source_path, mount = %self.from.mount, "Syncing secret");

        let source = match with_cancel(cancel, self.source.read(&self.from.mount, &source_path)).await
        {
            Ok(secret) => secret,
            Err(e) => return SyncOutcome::failed(key, OutcomeKind::ReadFailed, e),
        };

        let written = match with_cancel(
            cancel,
            self.destination
                .write(&self.to.mount, &destination_path, &source.document),
        )
        .await
        {
            Ok(version) => version,
            Err(e) => return SyncOutcome::failed(key, OutcomeKind::WriteFailed, e),
        };

        let copy = match with_cancel(
            cancel,
            self.destination.read(&self.to.mount, &destination_path),
        )
        .await
        {
            Ok(secret) => secret,
            Err(e) => return SyncOutcome::failed(key, OutcomeKind::VerifyReadFailed, e),
        };

        let expected = document_digest(&Value::Object(source.document));
        let actual = document_digest(&Value::Object(copy.document));

        if expected == actual {
            debug!(
                secret = %destination_path,
                source_version = ?source.version,
                written_version = ?written,
                "Secret verified"
            );
            SyncOutcome::synced(key)
        } else {
            SyncOutcome::failed(
                key,
                OutcomeKind::Mismatch,
                format!(
                    "source digest {} != destination digest {}",
                    &expected[..12],
                    &actual[..12]
                ),
            )
        }
    }
}
