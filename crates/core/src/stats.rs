//! Summary statistics reported alongside (or instead of) a final result.

use serde::{Deserialize, Serialize};

/// Element statistics returned in place of a matrix that is too large to
/// send back in full. `std` is the population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

/// Aggregate of the per-tile compute durations reported by workers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub total: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Compute [`MatrixSummary`] over `values`. Returns `None` for an empty slice.
pub fn summarize(values: &[f64]) -> Option<MatrixSummary> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
    for &v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }
    let mean = sum / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(MatrixSummary {
        min,
        max,
        mean,
        std: variance.sqrt(),
    })
}

/// Compute [`DurationStats`] over `times`. Returns `None` when nothing was recorded.
pub fn duration_stats(times: &[f64]) -> Option<DurationStats> {
    if times.is_empty() {
        return None;
    }
    let total: f64 = times.iter().sum();
    Some(DurationStats {
        total,
        avg: total / times.len() as f64,
        min: times.iter().copied().fold(f64::INFINITY, f64::min),
        max: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_empty_is_none() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn summarize_matches_population_statistics() {
        let s = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn duration_stats_totals_and_bounds() {
        let s = duration_stats(&[0.5, 0.25, 1.25]).unwrap();
        assert!((s.total - 2.0).abs() < 1e-12);
        assert!((s.avg - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.min, 0.25);
        assert_eq!(s.max, 1.25);
        assert!(duration_stats(&[]).is_none());
    }
}
