//! Three-dimensional block decomposition of `A (m x n) x B (n x p)`.
//!
//! The output is split into `row_tiles x col_tiles` cells of edge `b`, and
//! the shared inner dimension into `depth_tiles` slabs. Task `(i, j, k)`
//! carries `A[i*b.., k*b..]` and `B[k*b.., j*b..]`; the last tile along each
//! axis holds the remainder when `b` does not divide the extent.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::matrix::Matrix;
use crate::types::{Shape, TileCoord};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower bound of the automatically selected block size.
pub const MIN_DEFAULT_BLOCK_SIZE: usize = 50;

/// Upper bound of the automatically selected block size.
pub const MAX_DEFAULT_BLOCK_SIZE: usize = 1000;

// ---------------------------------------------------------------------------
// Block size selection
// ---------------------------------------------------------------------------

/// Default tile edge for an inner dimension of `n`: `clamp(n / 10, 50, 1000)`.
pub fn default_block_size(n: usize) -> usize {
    (n / 10).clamp(MIN_DEFAULT_BLOCK_SIZE, MAX_DEFAULT_BLOCK_SIZE)
}

/// Use `requested` when it is positive, otherwise fall back to
/// [`default_block_size`].
pub fn resolve_block_size(requested: Option<i64>, n: usize) -> usize {
    match requested {
        Some(b) if b > 0 => usize::try_from(b).unwrap_or(MAX_DEFAULT_BLOCK_SIZE),
        _ => default_block_size(n),
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Geometry of the tile grid for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Tile edge length `b`.
    pub block_size: usize,
    /// Rows of `A` (and of the result).
    pub m: usize,
    /// Shared inner dimension.
    pub n: usize,
    /// Columns of `B` (and of the result).
    pub p: usize,
}

impl TileGrid {
    /// Grid for `A (shape_a) x B (shape_b)` with tile edge `block_size`.
    pub fn new(shape_a: Shape, shape_b: Shape, block_size: usize) -> Result<Self, CoreError> {
        if shape_a.cols() != shape_b.rows() {
            return Err(CoreError::DimensionMismatch {
                operation: "decompose",
                left: shape_a,
                right: shape_b,
            });
        }
        if block_size == 0 {
            return Err(CoreError::Validation(
                "Block size must be positive".to_string(),
            ));
        }
        Ok(Self {
            block_size,
            m: shape_a.rows(),
            n: shape_a.cols(),
            p: shape_b.cols(),
        })
    }

    pub fn row_tiles(&self) -> usize {
        self.m.div_ceil(self.block_size)
    }

    pub fn col_tiles(&self) -> usize {
        self.p.div_ceil(self.block_size)
    }

    pub fn depth_tiles(&self) -> usize {
        self.n.div_ceil(self.block_size)
    }

    /// `row_tiles * col_tiles * depth_tiles`.
    pub fn expected_tiles(&self) -> usize {
        self.row_tiles() * self.col_tiles() * self.depth_tiles()
    }

    /// Result rows covered by row tile `i`.
    pub fn row_range(&self, i: usize) -> Range<usize> {
        self.span(i, self.m)
    }

    /// Result columns covered by column tile `j`.
    pub fn col_range(&self, j: usize) -> Range<usize> {
        self.span(j, self.p)
    }

    /// Inner-dimension indices covered by depth tile `k`.
    pub fn depth_range(&self, k: usize) -> Range<usize> {
        self.span(k, self.n)
    }

    /// Every tile coordinate, `i` outermost and `k` innermost.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let (rows, cols, depth) = (self.row_tiles(), self.col_tiles(), self.depth_tiles());
        (0..rows).flat_map(move |i| {
            (0..cols).flat_map(move |j| (0..depth).map(move |k| TileCoord::new(i, j, k)))
        })
    }

    fn span(&self, index: usize, extent: usize) -> Range<usize> {
        let start = index * self.block_size;
        start..(start + self.block_size).min(extent)
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// One tile-multiply task: `sub_a` is `rows(i) x depth(k)`, `sub_b` is
/// `depth(k) x cols(j)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileTask {
    pub coord: TileCoord,
    pub sub_a: Matrix,
    pub sub_b: Matrix,
}

/// A validated decomposition of `A x B`.
///
/// Tasks are materialised on demand so a dispatcher can keep only the
/// in-flight sub-blocks in memory.
#[derive(Debug, Clone, Copy)]
pub struct Decomposition<'a> {
    a: &'a Matrix,
    b: &'a Matrix,
    grid: TileGrid,
}

impl<'a> Decomposition<'a> {
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Number of tasks, equal to [`TileGrid::expected_tiles`].
    pub fn len(&self) -> usize {
        self.grid.expected_tiles()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the task at `coord`.
    pub fn task(&self, coord: TileCoord) -> Result<TileTask, CoreError> {
        let rows = self.grid.row_range(coord.i);
        let cols = self.grid.col_range(coord.j);
        let depth = self.grid.depth_range(coord.k);
        Ok(TileTask {
            coord,
            sub_a: self.a.slice(rows, depth.clone())?,
            sub_b: self.b.slice(depth, cols)?,
        })
    }

    /// Lazily build every task in grid order.
    pub fn tasks(&self) -> impl Iterator<Item = Result<TileTask, CoreError>> + '_ {
        self.grid.coords().map(move |coord| self.task(coord))
    }
}

/// Split `a x b` into tile tasks with edge `block_size`.
///
/// Fails with [`CoreError::DimensionMismatch`] when `a.cols != b.rows`.
pub fn decompose<'a>(
    a: &'a Matrix,
    b: &'a Matrix,
    block_size: usize,
) -> Result<Decomposition<'a>, CoreError> {
    let grid = TileGrid::new(a.shape(), b.shape(), block_size)?;
    Ok(Decomposition { a, b, grid })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
