use super::plan::SecretKey;
use serde::Serialize;

/// Result tag for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Written and verified.
    Synced,
    /// Source read failed; destination untouched.
    ReadFailed,
    WriteFailed,
    /// Written, but the read-back failed so the copy is unconfirmed.
    VerifyReadFailed,
    Mismatch,
    /// The worker task panicked or was torn down.
    WorkerFailed,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Synced => "synced",
            OutcomeKind::ReadFailed => "read_failed",
            OutcomeKind::WriteFailed => "write_failed",
            OutcomeKind::VerifyReadFailed => "verify_read_failed",
            OutcomeKind::Mismatch => "mismatch",
            OutcomeKind::WorkerFailed => "worker_failed",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub key: SecretKey,
    pub kind: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SyncOutcome {
    pub fn synced(key: impl Into<SecretKey>) -> Self {
        Self {
            key: key.into(),
            kind: OutcomeKind::Synced,
            detail: None,
        }
    }

    pub fn failed(key: impl Into<SecretKey>, kind: OutcomeKind, detail: impl ToString) -> Self {
        Self {
            key: key.into(),
            kind,
            detail: Some(detail.to_string()),
        }
    }

    pub fn is_synced(&self) -> bool {
        self.kind == OutcomeKind::Synced
    }
}

/// Aggregated result of one sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: String,
    pub batch_count: usize,
    pub batches_dispatched: usize,
    pub cancelled: bool,
    /// Every outcome, in enumeration order.
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    pub fn new(run_id: impl Into<String>, batch_count: usize) -> Self {
        Self {
            run_id: run_id.into(),
            batch_count,
            batches_dispatched: 0,
            cancelled: false,
            outcomes: Vec::new(),
        }
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn synced(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_synced()).count()
    }

    pub fn failures(&self) -> Vec<&SyncOutcome> {
        self.outcomes.iter().filter(|o| !o.is_synced()).collect()
    }

    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(SyncOutcome::is_synced)
    }

    pub fn kinds(&self) -> Vec<OutcomeKind> {
        self.outcomes.iter().map(|o| o.kind).collect()
    }

    /// Human-readable summary: counts first, then one line per failed key.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} of {} keys synced ({} failed) across {}/{} batches{}",
            self.synced(),
            self.attempted(),
            self.attempted() - self.synced(),
            self.batches_dispatched,
            self.batch_count,
            if self.cancelled { ", run cancelled" } else { "" },
        )];
        for failure in self.failures() {
            lines.push(match &failure.detail {
                Some(detail) => format!("  {} {}: {}", failure.kind, failure.key, detail),
                None => format!("  {} {}", failure.kind, failure.key),
            });
        }
        lines
    }
}
