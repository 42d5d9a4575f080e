//! Periodic removal of expired jobs.
//!
//! Only spawned when `JOB_TTL_SECS` is set; by default jobs are kept for
//! the lifetime of the process.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::registry::JobRegistry;

/// Run one sweep: drop every job registered more than `ttl` ago.
///
/// Returns the number of jobs removed.
pub async fn sweep(registry: &JobRegistry, ttl: chrono::Duration) -> usize {
    let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
        return 0;
    };
    let removed = registry.remove_older_than(cutoff).await;
    if removed.is_empty() {
        tracing::debug!("Job expiry: nothing to remove");
    } else {
        tracing::info!(removed = removed.len(), job_ids = ?removed, "Job expiry: removed jobs");
    }
    removed.len()
}

/// Run the expiry loop until `cancel` is triggered.
pub async fn run(
    registry: Arc<JobRegistry>,
    ttl: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    let ttl = match chrono::Duration::from_std(ttl) {
        Ok(ttl) => ttl,
        Err(e) => {
            tracing::error!(error = %e, "Job expiry: TTL out of range, sweeper disabled");
            return;
        }
    };

    tracing::info!(
        ttl_secs = ttl.num_seconds(),
        interval_secs = interval.as_secs(),
        "Job expiry sweeper started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job expiry sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                sweep(&registry, ttl).await;
            }
        }
    }
}
