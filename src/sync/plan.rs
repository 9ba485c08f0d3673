use crate::error::SyncError;

/// A key as returned by enumeration, relative to the configured path.
pub type SecretKey = String;

/// Ordered batches covering the enumerated key list exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunPlan {
    batches: Vec<Vec<SecretKey>>,
}

impl RunPlan {
    pub fn batches(&self) -> &[Vec<SecretKey>] {
        &self.batches
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn key_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn into_batches(self) -> Vec<Vec<SecretKey>> {
        self.batches
    }
}

/// Slice `keys` into contiguous batches of `batch_size`, preserving order.
/// Only the last batch may be shorter.
pub fn plan_batches(keys: Vec<SecretKey>, batch_size: i64) -> Result<RunPlan, SyncError> {
    if batch_size <= 0 {
        return Err(SyncError::InvalidBatchSize(batch_size));
    }
    let size = usize::try_from(batch_size).unwrap_or(usize::MAX);

    let batches = keys.chunks(size).map(<[SecretKey]>::to_vec).collect();
    Ok(RunPlan { batches })
}
