//! `hvm`: copy KV v2 secrets from one Vault to another, verifying every key.
//!
//! The engine lives in [`sync`]: keys are enumerated once, sliced into
//! ordered batches, and each batch fans out one worker per key that reads
//! from the source, writes to the destination and reads the value back to
//! compare digests.

pub mod cli;
pub mod config;
pub mod error;
pub mod infra;
pub mod logging;
pub mod runner;
pub mod store;
pub mod sync;

pub use error::{ErrorCategory, SyncError};
