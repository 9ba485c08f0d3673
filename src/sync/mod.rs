//! The batched copy-and-verify engine.
//!
//! [`Syncer`] enumerates the source key space once, plans fixed-size
//! batches, and runs one [`SyncWorker`] task per key of a batch, joining the
//! whole batch before the next one starts. Per-key results are
//! [`SyncOutcome`]s; only enumeration problems fail a run.

pub mod digest;
mod enumerate;
mod orchestrator;
mod outcome;
mod plan;
mod reporter;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use digest::{canonical_bytes, document_digest, documents_match};
pub use enumerate::Enumerator;
pub use orchestrator::{SyncPhase, SyncSettings, Syncer};
pub use outcome::{OutcomeKind, SyncOutcome, SyncReport};
pub use plan::{plan_batches, RunPlan, SecretKey};
pub use reporter::{SyncReporter, TracingReporter};
pub use worker::SyncWorker;
