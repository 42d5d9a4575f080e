//! Domain core for distributed block matrix multiplication.
//!
//! Pure, transport-agnostic building blocks shared by every service: the
//! dense [`Matrix`](matrix::Matrix), the tile decomposition, the wire
//! schemas exchanged between services, and summary statistics. Nothing in
//! this crate performs I/O.

pub mod error;
pub mod matrix;
pub mod protocol;
pub mod stats;
pub mod tiling;
pub mod types;
