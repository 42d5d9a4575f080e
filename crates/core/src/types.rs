use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque job identifier, caller- or system-generated.
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Position of one tile-multiply task in the 3-D tile grid.
///
/// `i` indexes row tiles of the output, `j` column tiles, and `k` the
/// shared inner (depth) dimension that is summed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

impl TileCoord {
    pub fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }

    /// The output cell `(i, j)` this tile contributes to.
    pub fn cell(&self) -> (usize, usize) {
        (self.i, self.j)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.i, self.j, self.k)
    }
}

/// Matrix dimensions. Serializes as `[rows, cols]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape(pub usize, pub usize);

impl Shape {
    pub fn rows(&self) -> usize {
        self.0
    }

    pub fn cols(&self) -> usize {
        self.1
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.0 * self.1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.0, self.1)
    }
}
