//! Reporting hooks for a sync run.
//!
//! The orchestrator and workers never log outcomes through global state;
//! they call the [`SyncReporter`] they were built with. [`TracingReporter`]
//! is the default used by the binary.

use super::orchestrator::SyncPhase;
use super::outcome::{SyncOutcome, SyncReport};
use super::plan::SecretKey;
use tracing::{debug, error, info, warn};

pub trait SyncReporter: Send + Sync {
    fn phase_changed(&self, _phase: &SyncPhase) {}

    fn batch_started(&self, _index: usize, _keys: &[SecretKey]) {}

    /// Called by the worker as soon as a key's outcome is known.
    fn key_finished(&self, outcome: &SyncOutcome);

    fn batch_finished(&self, _index: usize, _outcomes: &[SyncOutcome]) {}

    fn run_finished(&self, _report: &SyncReport) {}
}

/// Logs every event through `tracing`.
pub struct TracingReporter {
    mount: String,
}

impl TracingReporter {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
        }
    }
}

impl SyncReporter for TracingReporter {
    fn phase_changed(&self, phase: &SyncPhase) {
        match phase {
            SyncPhase::Start => debug!("Sync starting"),
            SyncPhase::Enumerating => info!(mount = %self.mount, "Listing source keys"),
            SyncPhase::Dispatching { batch, of } => {
                debug!(batch = batch + 1, of, "Dispatching batch")
            }
            SyncPhase::Done => info!("Sync complete"),
            SyncPhase::Failed => error!("Sync failed during enumeration"),
        }
    }

    fn batch_started(&self, index: usize, keys: &[SecretKey]) {
        debug!(batch = index + 1, keys = keys.len(), "Batch started");
    }

    fn key_finished(&self, outcome: &SyncOutcome) {
        match &outcome.detail {
            None if outcome.is_synced() => {
                debug!(secret = %outcome.key, mount = %self.mount, "Secret synced")
            }
            detail => error!(
                secret = %outcome.key,
                mount = %self.mount,
                outcome = %outcome.kind,
                detail = detail.as_deref().unwrap_or(""),
                "Secret did not sync"
            ),
        }
    }

    fn batch_finished(&self, index: usize, outcomes: &[SyncOutcome]) {
        let failed = outcomes.iter().filter(|o| !o.is_synced()).count();
        if failed > 0 {
            warn!(batch = index + 1, failed, total = outcomes.len(), "Batch finished with failures");
        } else {
            info!(batch = index + 1, total = outcomes.len(), "Batch finished");
        }
    }

    fn run_finished(&self, report: &SyncReport) {
        for (i, line) in report.summary_lines().iter().enumerate() {
            if i == 0 {
                info!(run_id = %report.run_id, "{line}");
            } else {
                warn!(run_id = %report.run_id, "{}", line.trim_start());
            }
        }
    }
}
