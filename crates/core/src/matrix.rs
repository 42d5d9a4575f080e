//! Dense row-major `f64` matrix.
//!
//! On the wire a matrix is a JSON array of rows. Deserialization goes
//! through [`Matrix::from_rows`], so ragged, empty, or non-finite input is
//! rejected at the boundary and never reaches compute or accumulation code.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CoreError;
use crate::types::Shape;

/// Below this many output elements the multiply stays on the calling thread.
const PARALLEL_THRESHOLD: usize = 64 * 64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for d in 0..n {
            m.data[d * n + d] = 1.0;
        }
        m
    }

    /// Build a matrix from row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, CoreError> {
        if rows == 0 || cols == 0 {
            return Err(CoreError::Validation(format!(
                "Matrix must have at least one row and one column, got {rows}x{cols}"
            )));
        }
        if data.len() != rows * cols {
            return Err(CoreError::Validation(format!(
                "Matrix data has {} elements, expected {} for shape {rows}x{cols}",
                data.len(),
                rows * cols
            )));
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::Validation(format!(
                "Matrix element ({}, {}) is not a finite number",
                pos / cols,
                pos % cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from a list of equally sized rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, CoreError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != n_cols) {
            return Err(CoreError::Validation(format!(
                "Matrix rows must all have the same length: row 0 has {n_cols} elements, row {bad} has {}",
                rows[bad].len()
            )));
        }
        let data = rows.into_iter().flatten().collect();
        Self::from_vec(n_rows, n_cols, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        Shape(self.rows, self.cols)
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Row-major element slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    /// Copy out the sub-block covering `rows x cols`.
    pub fn slice(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Matrix, CoreError> {
        if rows.start >= rows.end
            || cols.start >= cols.end
            || rows.end > self.rows
            || cols.end > self.cols
        {
            return Err(CoreError::Validation(format!(
                "Block [{}..{}, {}..{}] is outside a {} matrix",
                rows.start,
                rows.end,
                cols.start,
                cols.end,
                self.shape()
            )));
        }
        let width = cols.end - cols.start;
        let mut data = Vec::with_capacity((rows.end - rows.start) * width);
        for r in rows.clone() {
            let start = r * self.cols;
            data.extend_from_slice(&self.data[start + cols.start..start + cols.end]);
        }
        Ok(Matrix {
            rows: rows.end - rows.start,
            cols: width,
            data,
        })
    }

    /// Matrix product `self x rhs`.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix, CoreError> {
        if self.cols != rhs.rows {
            return Err(CoreError::DimensionMismatch {
                operation: "multiply",
                left: self.shape(),
                right: rhs.shape(),
            });
        }

        let mut out = Matrix::zeros(self.rows, rhs.cols);
        let row_kernel = |(r, out_row): (usize, &mut [f64])| {
            let lhs_row = self.row(r);
            for (inner, &a) in lhs_row.iter().enumerate() {
                if a == 0.0 {
                    continue;
                }
                for (o, &b) in out_row.iter_mut().zip(rhs.row(inner)) {
                    *o += a * b;
                }
            }
        };

        if out.len() >= PARALLEL_THRESHOLD {
            out.data
                .par_chunks_mut(rhs.cols)
                .enumerate()
                .for_each(row_kernel);
        } else {
            out.data.chunks_mut(rhs.cols).enumerate().for_each(row_kernel);
        }
        Ok(out)
    }

    /// Element-wise `self += rhs`.
    pub fn add_assign(&mut self, rhs: &Matrix) -> Result<(), CoreError> {
        if self.shape() != rhs.shape() {
            return Err(CoreError::DimensionMismatch {
                operation: "accumulate",
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a += b;
        }
        Ok(())
    }

    /// Concatenate blocks left to right. All blocks must have the same row count.
    pub fn hstack(blocks: &[&Matrix]) -> Result<Matrix, CoreError> {
        let first = blocks
            .first()
            .ok_or_else(|| CoreError::Validation("Cannot concatenate zero blocks".to_string()))?;
        let rows = first.rows;
        if let Some(bad) = blocks.iter().find(|b| b.rows != rows) {
            return Err(CoreError::DimensionMismatch {
                operation: "horizontal concatenation",
                left: first.shape(),
                right: bad.shape(),
            });
        }
        let cols = blocks.iter().map(|b| b.cols).sum();
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for block in blocks {
                data.extend_from_slice(block.row(r));
            }
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Concatenate blocks top to bottom. All blocks must have the same column count.
    pub fn vstack(blocks: &[Matrix]) -> Result<Matrix, CoreError> {
        let first = blocks
            .first()
            .ok_or_else(|| CoreError::Validation("Cannot concatenate zero blocks".to_string()))?;
        let cols = first.cols;
        if let Some(bad) = blocks.iter().find(|b| b.cols != cols) {
            return Err(CoreError::DimensionMismatch {
                operation: "vertical concatenation",
                left: first.shape(),
                right: bad.shape(),
            });
        }
        let rows = blocks.iter().map(|b| b.rows).sum();
        let mut data = Vec::with_capacity(rows * cols);
        for block in blocks {
            data.extend_from_slice(&block.data);
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Element-wise closeness check with numpy `allclose` semantics:
    /// `|a - b| <= atol + rtol * |b|` for every element.
    pub fn approx_eq(&self, other: &Matrix, rtol: f64, atol: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= atol + rtol * b.abs())
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = CoreError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Matrix::from_rows(rows)
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.data.chunks(self.cols))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
