use super::plan::SecretKey;
use crate::error::SyncError;
use crate::store::{with_cancel, MountPath, SecretStore};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Lists the keys to migrate from the source store.
pub struct Enumerator {
    store: Arc<dyn SecretStore>,
    recursive: bool,
}

impl Enumerator {
    pub fn new(store: Arc<dyn SecretStore>, recursive: bool) -> Self {
        Self { store, recursive }
    }

    /// All secret keys under `root`, in listing order.
    ///
    /// Folder entries (trailing `/`) are skipped unless the enumerator is
    /// recursive, in which case their keys are returned as `folder/key`.
    /// An empty result is an error, never a "nothing to do".
    pub async fn list(
        &self,
        cancel: &CancellationToken,
        root: &MountPath,
    ) -> Result<Vec<SecretKey>, SyncError> {
        debug!(path = %root.path, mount = %root.mount, "Listing source vault");

        let mut keys = Vec::new();
        self.collect(cancel, root, String::new(), &mut keys).await?;

        if keys.is_empty() {
            return Err(SyncError::EmptyListing {
                mount: root.mount.clone(),
                path: root.path.clone(),
            });
        }
        Ok(keys)
    }

    fn collect<'a>(
        &'a self,
        cancel: &'a CancellationToken,
        root: &'a MountPath,
        prefix: String,
        out: &'a mut Vec<SecretKey>,
    ) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(async move {
            let path = if prefix.is_empty() {
                root.path.clone()
            } else {
                root.secret_path(&prefix)
            };

            let entries = with_cancel(cancel, self.store.list(&root.mount, &path))
                .await
                .map_err(|source| SyncError::ListFailed {
                    mount: root.mount.clone(),
                    path: path.clone(),
                    source,
                })?;

            for entry in entries {
                let key = format!("{prefix}{entry}");
                if !entry.ends_with('/') {
                    out.push(key);
                } else if self.recursive {
                    self.collect(cancel, root, key, out).await?;
                } else {
                    warn!(folder = %key, mount = %root.mount, "Skipping sub-folder; enable `recursive` to include it");
                }
            }
            Ok(())
        })
    }
}
