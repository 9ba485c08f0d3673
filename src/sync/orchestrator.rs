use super::enumerate::Enumerator;
use super::outcome::{OutcomeKind, SyncOutcome, SyncReport};
use super::plan::{plan_batches, SecretKey};
use super::reporter::SyncReporter;
use super::worker::SyncWorker;
use crate::error::SyncError;
use crate::store::{MountPath, SecretStore};
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

/// Where a run currently is.
///
/// `Start → Enumerating → Dispatching(1..=N) → Done`. `Failed` is only
/// reachable from `Enumerating`; key failures never fail the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Start,
    Enumerating,
    /// Zero-based batch index out of `of` batches.
    Dispatching { batch: usize, of: usize },
    Done,
    Failed,
}

/// Fully resolved run parameters.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub batch_size: i64,
    pub source: MountPath,
    /// Where keys land. Usually equal to `source`.
    pub destination: MountPath,
    pub recursive: bool,
    /// Turn any non-`Synced` outcome into a run-level error.
    pub fail_on_key_errors: bool,
}

/// Drives enumeration, batching and the per-batch worker fan-out.
pub struct Syncer {
    settings: SyncSettings,
    enumerator: Enumerator,
    worker: Arc<SyncWorker>,
    reporter: Arc<dyn SyncReporter>,
}

impl Syncer {
    pub fn new(
        settings: SyncSettings,
        source: Arc<dyn SecretStore>,
        destination: Arc<dyn SecretStore>,
        reporter: Arc<dyn SyncReporter>,
    ) -> Result<Self, SyncError> {
        if settings.batch_size <= 0 {
            return Err(SyncError::InvalidBatchSize(settings.batch_size));
        }

        let enumerator = Enumerator::new(Arc::clone(&source), settings.recursive);
        let worker = Arc::new(SyncWorker::new(
            source,
            destination,
            settings.source.clone(),
            settings.destination.clone(),
            Arc::clone(&reporter),
        ));

        Ok(Self {
            settings,
            enumerator,
            worker,
            reporter,
        })
    }

    /// Run one full sync.
    ///
    /// Returns `Err` only when enumeration fails, or when the
    /// `fail_on_key_errors` policy is on and some key did not sync. Once
    /// `cancel` fires no further batch is started; the report is marked
    /// cancelled.
    pub async fn sync(&self, cancel: CancellationToken) -> Result<SyncReport, SyncError> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("sync", run_id = %run_id);
        self.run(run_id, cancel).instrument(span).await
    }

    async fn run(&self, run_id: String, cancel: CancellationToken) -> Result<SyncReport, SyncError> {
        self.reporter.phase_changed(&SyncPhase::Start);
        self.reporter.phase_changed(&SyncPhase::Enumerating);

        let keys = match self.enumerator.list(&cancel, &self.settings.source).await {
            Ok(keys) => keys,
            Err(e) => {
                self.reporter.phase_changed(&SyncPhase::Failed);
                return Err(e);
            }
        };

        let plan = plan_batches(keys, self.settings.batch_size)?;
        let batch_count = plan.batch_count();
        let mut report = SyncReport::new(run_id, batch_count);

        for (index, batch) in plan.into_batches().into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    skipped = batch_count - index,
                    "Cancellation requested, not starting remaining batches"
                );
                break;
            }

            self.reporter.phase_changed(&SyncPhase::Dispatching {
                batch: index,
                of: batch_count,
            });
            self.reporter.batch_started(index, &batch);

            let outcomes = self.dispatch(&cancel, batch).await;

            self.reporter.batch_finished(index, &outcomes);
            report.batches_dispatched += 1;
            report.outcomes.extend(outcomes);
        }

        report.cancelled = cancel.is_cancelled();
        self.reporter.phase_changed(&SyncPhase::Done);
        self.reporter.run_finished(&report);

        let failed = report.attempted() - report.synced();
        if self.settings.fail_on_key_errors && failed > 0 {
            return Err(SyncError::KeysFailed {
                failed,
                attempted: report.attempted(),
            });
        }
        Ok(report)
    }

    /// Spawn one worker task per key and wait for all of them.
    /// Outcomes come back in batch order.
    async fn dispatch(&self, cancel: &CancellationToken, batch: Vec<SecretKey>) -> Vec<SyncOutcome> {
        let handles: Vec<_> = batch
            .iter()
            .map(|key| {
                let worker = Arc::clone(&self.worker);
                let cancel = cancel.clone();
                let key = key.clone();
                tokio::spawn(async move { worker.sync(&cancel, &key).await }.in_current_span())
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(batch)
            .map(|(joined, key)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    let outcome = SyncOutcome::failed(key, OutcomeKind::WorkerFailed, e);
                    self.reporter.key_finished(&outcome);
                    outcome
                }
            })
            .collect()
    }
}
