//! Run-level error taxonomy.
//!
//! Everything in here is fatal to a sync run. Per-key failures never surface
//! as a [`SyncError`]; they are recorded as [`crate::sync::SyncOutcome`]s.
//! The one exception is [`SyncError::KeysFailed`], produced only when the
//! `failOnKeyErrors` policy is switched on.

use crate::store::StoreError;
use thiserror::Error;

/// Why a token command did not yield a usable process result.
#[derive(Debug, Error)]
pub enum TokenCommandError {
    #[error("command is empty")]
    Empty,
    #[error("failed to spawn: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("timed out after {0}s")]
    TimedOut(u64),
    #[error("output exceeds {0} bytes")]
    OutputTooLarge(usize),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid batch size {0}: must be greater than zero")]
    InvalidBatchSize(i64),

    #[error("{endpoint}: either a token or a token command must be configured")]
    TokenSourceMissing { endpoint: String },

    #[error("{endpoint}: token and token command are mutually exclusive")]
    TokenSourceConflict { endpoint: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("token command `{command}` failed: {source}")]
    TokenCommandFailed {
        command: String,
        #[source]
        source: TokenCommandError,
    },

    #[error("token command `{command}` did not return a vault token")]
    TokenFormatInvalid { command: String },

    #[error("failed to build client for {address}: {source}")]
    ClientInit {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to list {mount}/{path}: {source}")]
    ListFailed {
        mount: String,
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("listing {mount}/{path} returned no keys")]
    EmptyListing { mount: String, path: String },

    #[error("{failed} of {attempted} keys did not sync")]
    KeysFailed { failed: usize, attempted: usize },
}

/// Coarse grouping of [`SyncError`] used for exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Enumeration,
    Sync,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::InvalidBatchSize(_)
            | SyncError::TokenSourceMissing { .. }
            | SyncError::TokenSourceConflict { .. }
            | SyncError::InvalidConfig(_)
            | SyncError::ClientInit { .. } => ErrorCategory::Configuration,
            SyncError::TokenCommandFailed { .. } | SyncError::TokenFormatInvalid { .. } => {
                ErrorCategory::Authentication
            }
            SyncError::ListFailed { .. } | SyncError::EmptyListing { .. } => {
                ErrorCategory::Enumeration
            }
            SyncError::KeysFailed { .. } => ErrorCategory::Sync,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SyncError::InvalidBatchSize(_) => "invalid_batch_size",
            SyncError::TokenSourceMissing { .. } => "token_source_missing",
            SyncError::TokenSourceConflict { .. } => "token_source_conflict",
            SyncError::InvalidConfig(_) => "invalid_config",
            SyncError::TokenCommandFailed { .. } => "token_command_failed",
            SyncError::TokenFormatInvalid { .. } => "token_format_invalid",
            SyncError::ClientInit { .. } => "client_init",
            SyncError::ListFailed { .. } => "list_failed",
            SyncError::EmptyListing { .. } => "empty_listing",
            SyncError::KeysFailed { .. } => "keys_failed",
        }
    }
}
