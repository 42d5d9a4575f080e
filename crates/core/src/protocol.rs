//! Request and response schemas shared by the splitter, worker, and
//! aggregator services.
//!
//! Matrices are validated during deserialization (see [`Matrix`]); the
//! `validate` methods here cover the remaining field-level rules so that
//! malformed input is rejected before it reaches accumulation logic.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::matrix::Matrix;
use crate::stats::{DurationStats, MatrixSummary};
use crate::types::{JobId, Shape, TileCoord, Timestamp};

/// Maximum length of a job identifier.
pub const MAX_JOB_ID_LEN: usize = 128;

/// Validate a job identifier.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_JOB_ID_LEN` characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters
///   (it is used as a URL path segment).
pub fn validate_job_id(job_id: &str) -> Result<(), CoreError> {
    if job_id.is_empty() {
        return Err(CoreError::Validation("Job id must not be empty".to_string()));
    }
    if job_id.len() > MAX_JOB_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Job id must not exceed {MAX_JOB_ID_LEN} characters"
        )));
    }
    if !job_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(format!(
            "Job id '{job_id}' may only contain alphanumeric, hyphen, underscore, or dot characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Aggregator: register
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterJobRequest {
    pub job_id: JobId,
    pub expected_tiles: usize,
    pub row_tiles: usize,
    pub col_tiles: usize,
}

impl RegisterJobRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_job_id(&self.job_id)?;
        if self.row_tiles == 0 || self.col_tiles == 0 || self.expected_tiles == 0 {
            return Err(CoreError::Validation(
                "expected_tiles, row_tiles, and col_tiles must be positive".to_string(),
            ));
        }
        let cells = self.row_tiles.checked_mul(self.col_tiles).ok_or_else(|| {
            CoreError::Validation("row_tiles * col_tiles overflows".to_string())
        })?;
        if self.expected_tiles % cells != 0 {
            return Err(CoreError::Validation(format!(
                "expected_tiles ({}) must be a multiple of row_tiles * col_tiles ({cells})",
                self.expected_tiles
            )));
        }
        Ok(())
    }

    /// Number of depth tiles implied by the registration.
    pub fn depth_tiles(&self) -> usize {
        self.expected_tiles / (self.row_tiles * self.col_tiles)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterJobResponse {
    pub message: String,
    pub expected: usize,
    /// `false` when the job already existed and its configuration was kept.
    pub created: bool,
}

// ---------------------------------------------------------------------------
// Aggregator: submit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTileRequest {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub product: Matrix,
    pub duration_sec: f64,
}

impl SubmitTileRequest {
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.i, self.j, self.k)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.duration_sec.is_finite() || self.duration_sec < 0.0 {
            return Err(CoreError::Validation(format!(
                "duration_sec must be a non-negative number, got {}",
                self.duration_sec
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTileResponse {
    pub message: String,
    /// `true` when `(i, j, k)` had already been accumulated and this
    /// submission was absorbed without effect.
    pub duplicate: bool,
    pub received: usize,
    pub expected: usize,
}

// ---------------------------------------------------------------------------
// Aggregator: final result / listing
// ---------------------------------------------------------------------------

/// Lifecycle of a job at the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Registered,
    Accumulating,
    Ready,
}

/// Response of the final-result query. Not-ready is a status, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FinalResult {
    NotReady { received: usize, expected: usize },
    Ready(ReadyResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyResult {
    pub shape: Shape,
    /// Full matrix, present when its element count is within the threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Matrix>,
    /// Present instead of `matrix` for large results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<MatrixSummary>,
    pub aggregation_time_sec: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_time_stats: Option<DurationStats>,
}

/// Per-job progress entry returned by the job listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub received: usize,
    pub expected: usize,
    pub row_tiles: usize,
    pub col_tiles: usize,
    pub depth_tiles: usize,
    pub state: JobState,
    pub registered_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Worker: multiply
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplyTileRequest {
    pub job_id: JobId,
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub sub_a: Matrix,
    pub sub_b: Matrix,
    /// Overrides the worker's configured aggregator for this tile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregator_url: Option<String>,
}

impl MultiplyTileRequest {
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.i, self.j, self.k)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_job_id(&self.job_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplyTileResponse {
    pub message: String,
    pub shape: Shape,
    pub compute_time_sec: f64,
}

// ---------------------------------------------------------------------------
// Splitter: split
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub a: Matrix,
    pub b: Matrix,
    /// Tile edge. Missing or non-positive selects the default.
    #[serde(default)]
    pub block_size: Option<i64>,
    /// Caller-chosen job id; generated when absent.
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub worker_url: Option<String>,
    #[serde(default)]
    pub aggregator_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitResponse {
    pub job_id: JobId,
    pub block_size: usize,
    pub row_tiles: usize,
    pub col_tiles: usize,
    pub depth_tiles: usize,
    pub expected_tiles: usize,
    pub dispatched: usize,
    pub failed: usize,
    /// Tiles that could not be delivered; the job will never become ready
    /// unless they are resubmitted.
    pub failed_tiles: Vec<TileCoord>,
    pub shape_a: Shape,
    pub shape_b: Shape,
    pub time_sec: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
