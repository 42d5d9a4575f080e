use crate::types::{JobId, Shape};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Dimension mismatch in {operation}: {left} vs {right}")]
    DimensionMismatch {
        operation: &'static str,
        left: Shape,
        right: Shape,
    },

    #[error("Unknown job: {0}")]
    UnknownJob(JobId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Incomplete accumulation for job {job_id}: cell ({i}, {j}) is missing")]
    IncompleteAccumulation { job_id: JobId, i: usize, j: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}
