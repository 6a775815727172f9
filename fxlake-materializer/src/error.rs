use thiserror::Error;

/// Error taxonomy for candle construction, the relational upsert, and
/// coverage analysis.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// Drop rate exceeded 5% during cleaning. Aborts
    /// the unit of work being materialized; the caller is expected to log
    /// and continue to the next one, not crash the whole job.
    #[error("quality gate exceeded: {invalid}/{total} ticks invalid (drop rate {drop_rate:.3} > 0.05)")]
    Quality {
        drop_rate: f64,
        invalid: usize,
        total: usize,
    },

    /// A relational-store write failed. Propagated to the invoking
    /// CLI/job, which logs and exits non-zero.
    #[error("upsert to relational store failed: {0}")]
    Upsert(#[from] sqlx::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("malformed tick blob: {0}")]
    BlobDecode(#[from] serde_json::Error),
}

impl MaterializeError {
    /// Does this failure abort only the current materialization unit
    /// (day), or should it propagate and fail the whole job? Quality gate
    /// failures are the former; everything else involves infrastructure
    /// that can't be silently skipped without losing data.
    pub fn is_quality_gate(&self) -> bool {
        matches!(self, MaterializeError::Quality { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_error_is_not_infrastructure() {
        let error = MaterializeError::Quality {
            drop_rate: 0.06,
            invalid: 60,
            total: 1000,
        };
        assert!(error.is_quality_gate());
    }
}
