//! Per-job accumulation record.
//!
//! A [`JobRecord`] owns every partial product received for one job. It is
//! not synchronized itself; the registry wraps each record in its own
//! mutex so a whole [`JobRecord::submit`] call is one critical section.
//!
//! State machine:
//!
//! ```text
//! Registered --submit (received < expected)--> Accumulating
//! Accumulating --submit (received == expected)--> Ready
//! ```
//!
//! `Ready` is terminal: every in-range coordinate has been seen, so any
//! further submission is a duplicate.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use blockmul_core::error::CoreError;
use blockmul_core::matrix::Matrix;
use blockmul_core::protocol::{FinalResult, JobProgress, JobState, ReadyResult, RegisterJobRequest};
use blockmul_core::stats::{duration_stats, summarize};
use blockmul_core::types::{JobId, Shape, TileCoord, Timestamp};
use chrono::Utc;

/// Immutable grid description fixed at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub job_id: JobId,
    pub row_tiles: usize,
    pub col_tiles: usize,
    pub depth_tiles: usize,
    pub expected_tiles: usize,
    pub registered_at: Timestamp,
}

impl JobConfig {
    /// Build from an already validated registration request.
    pub fn from_request(request: &RegisterJobRequest) -> Self {
        Self {
            job_id: request.job_id.clone(),
            row_tiles: request.row_tiles,
            col_tiles: request.col_tiles,
            depth_tiles: request.depth_tiles(),
            expected_tiles: request.expected_tiles,
            registered_at: Utc::now(),
        }
    }

    fn contains(&self, coord: TileCoord) -> bool {
        coord.i < self.row_tiles && coord.j < self.col_tiles && coord.k < self.depth_tiles
    }
}

/// Result of a single submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted {
        received: usize,
        expected: usize,
        /// This submission completed the job.
        became_ready: bool,
    },
    /// `(i, j, k)` was already accumulated; nothing changed.
    Duplicate { received: usize, expected: usize },
}

impl SubmitOutcome {
    pub fn received(&self) -> usize {
        match self {
            SubmitOutcome::Accepted { received, .. } | SubmitOutcome::Duplicate { received, .. } => {
                *received
            }
        }
    }

    pub fn expected(&self) -> usize {
        match self {
            SubmitOutcome::Accepted { expected, .. } | SubmitOutcome::Duplicate { expected, .. } => {
                *expected
            }
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, SubmitOutcome::Duplicate { .. })
    }
}

/// Stitched matrix kept after the first ready read.
#[derive(Debug)]
struct Assembled {
    matrix: Matrix,
    aggregation_time_sec: f64,
}

#[derive(Debug)]
pub struct JobRecord {
    config: JobConfig,
    received: HashSet<TileCoord>,
    /// Running sum per output cell `(i, j)`, zero-initialized on first use.
    cells: HashMap<(usize, usize), Matrix>,
    /// Height of row band `i`, fixed by the first product seen for it.
    row_heights: HashMap<usize, usize>,
    /// Width of column band `j`, fixed by the first product seen for it.
    col_widths: HashMap<usize, usize>,
    worker_times: Vec<f64>,
    assembled: Option<Assembled>,
}

impl JobRecord {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            received: HashSet::new(),
            cells: HashMap::new(),
            row_heights: HashMap::new(),
            col_widths: HashMap::new(),
            worker_times: Vec::new(),
            assembled: None,
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn received(&self) -> usize {
        self.received.len()
    }

    pub fn state(&self) -> JobState {
        match self.received.len() {
            0 => JobState::Registered,
            n if n == self.config.expected_tiles => JobState::Ready,
            _ => JobState::Accumulating,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == JobState::Ready
    }

    /// Accumulate one partial product.
    ///
    /// Checks run before any mutation, so a rejected submission leaves the
    /// record exactly as it was.
    pub fn submit(
        &mut self,
        coord: TileCoord,
        product: &Matrix,
        duration_sec: f64,
    ) -> Result<SubmitOutcome, CoreError> {
        if !self.config.contains(coord) {
            return Err(CoreError::Validation(format!(
                "Tile {coord} is outside the {}x{}x{} grid of job {}",
                self.config.row_tiles, self.config.col_tiles, self.config.depth_tiles, self.config.job_id
            )));
        }

        if self.received.contains(&coord) {
            return Ok(SubmitOutcome::Duplicate {
                received: self.received.len(),
                expected: self.config.expected_tiles,
            });
        }

        self.check_band_shape(coord, product.shape())?;

        let (i, j) = coord.cell();
        match self.cells.get_mut(&(i, j)) {
            Some(cell) => cell.add_assign(product)?,
            None => {
                let mut cell = Matrix::zeros(product.rows(), product.cols());
                cell.add_assign(product)?;
                self.cells.insert((i, j), cell);
            }
        }
        self.row_heights.insert(i, product.rows());
        self.col_widths.insert(j, product.cols());
        self.received.insert(coord);
        self.worker_times.push(duration_sec);

        let received = self.received.len();
        Ok(SubmitOutcome::Accepted {
            received,
            expected: self.config.expected_tiles,
            became_ready: received == self.config.expected_tiles,
        })
    }

    /// Every product in row band `i` must share a height and every product
    /// in column band `j` a width, otherwise the bands cannot be stitched.
    fn check_band_shape(&self, coord: TileCoord, shape: Shape) -> Result<(), CoreError> {
        let height = self.row_heights.get(&coord.i).copied();
        let width = self.col_widths.get(&coord.j).copied();
        if height.is_some_and(|h| h != shape.rows()) || width.is_some_and(|w| w != shape.cols()) {
            return Err(CoreError::DimensionMismatch {
                operation: "accumulate",
                left: Shape(height.unwrap_or(shape.rows()), width.unwrap_or(shape.cols())),
                right: shape,
            });
        }
        Ok(())
    }

    pub fn progress(&self) -> JobProgress {
        JobProgress {
            received: self.received.len(),
            expected: self.config.expected_tiles,
            row_tiles: self.config.row_tiles,
            col_tiles: self.config.col_tiles,
            depth_tiles: self.config.depth_tiles,
            state: self.state(),
            registered_at: self.config.registered_at,
        }
    }

    /// Report progress, or the stitched result once every tile has arrived.
    ///
    /// The matrix is stitched on the first ready read and reused afterwards,
    /// so repeated reads return identical data and timing.
    pub fn final_result(&mut self, summary_threshold: usize) -> Result<FinalResult, CoreError> {
        if !self.is_ready() {
            return Ok(FinalResult::NotReady {
                received: self.received.len(),
                expected: self.config.expected_tiles,
            });
        }

        let assembled = match self.assembled.take() {
            Some(assembled) => assembled,
            None => {
                let started = Instant::now();
                let matrix = self.stitch()?;
                // Ready is terminal and duplicates only consult `received`.
                self.cells = HashMap::new();
                Assembled {
                    matrix,
                    aggregation_time_sec: started.elapsed().as_secs_f64(),
                }
            }
        };

        let shape = assembled.matrix.shape();
        let (matrix, summary) = if shape.len() > summary_threshold {
            (None, summarize(assembled.matrix.as_slice()))
        } else {
            (Some(assembled.matrix.clone()), None)
        };
        let result = ReadyResult {
            shape,
            matrix,
            summary,
            aggregation_time_sec: assembled.aggregation_time_sec,
            worker_time_stats: duration_stats(&self.worker_times),
        };
        self.assembled = Some(assembled);

        Ok(FinalResult::Ready(result))
    }

    /// Concatenate cells along each row band, then stack the bands.
    fn stitch(&self) -> Result<Matrix, CoreError> {
        let mut bands = Vec::with_capacity(self.config.row_tiles);
        for i in 0..self.config.row_tiles {
            let row: Vec<&Matrix> = (0..self.config.col_tiles)
                .map(|j| {
                    self.cells.get(&(i, j)).ok_or_else(|| CoreError::IncompleteAccumulation {
                        job_id: self.config.job_id.clone(),
                        i,
                        j,
                    })
                })
                .collect::<Result<_, _>>()?;
            bands.push(Matrix::hstack(&row)?);
        }
        Matrix::vstack(&bands)
    }
}
