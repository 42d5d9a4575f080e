//! Tile multiplication off the async executor.

use std::time::Instant;

use blockmul_core::error::CoreError;
use blockmul_core::matrix::Matrix;
use blockmul_server::error::AppError;

/// A product together with the time spent computing it.
#[derive(Debug, Clone)]
pub struct ComputedTile {
    pub product: Matrix,
    pub compute_time_sec: f64,
}

/// Multiply `sub_a x sub_b` on the blocking thread pool.
///
/// Shapes are checked before any thread is claimed, so a mismatch fails
/// fast with [`CoreError::DimensionMismatch`].
pub async fn multiply(sub_a: Matrix, sub_b: Matrix) -> Result<ComputedTile, AppError> {
    if sub_a.cols() != sub_b.rows() {
        return Err(CoreError::DimensionMismatch {
            operation: "multiply",
            left: sub_a.shape(),
            right: sub_b.shape(),
        }
        .into());
    }

    let computed = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        sub_a.matmul(&sub_b).map(|product| ComputedTile {
            product,
            compute_time_sec: started.elapsed().as_secs_f64(),
        })
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Multiply task failed: {e}")))??;

    Ok(computed)
}
