//! Tile dispatch.
//!
//! A job is registered with the aggregator before any tile leaves; if that
//! fails nothing is sent. Tasks are then materialised one at a time and
//! handed to a pool of at most `pool_size` concurrent sends, so only the
//! in-flight sub-blocks are held in memory.
//!
//! A tile that still fails after `max_retries` extra attempts is recorded in
//! [`DispatchReport::failed_tiles`]. Its job will never become ready; no
//! automatic re-queue happens after the call returns.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blockmul_client::{AggregatorClient, ClientError, WorkerClient};
use blockmul_core::protocol::{RegisterJobRequest, RegisterJobResponse};
use blockmul_core::tiling::{Decomposition, TileTask};
use blockmul_core::types::TileCoord;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::DispatchConfig;

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Registers a job before its tiles are dispatched.
#[async_trait]
pub trait JobRegistrar: Send + Sync {
    async fn register(&self, request: &RegisterJobRequest)
        -> Result<RegisterJobResponse, ClientError>;
}

#[async_trait]
impl JobRegistrar for AggregatorClient {
    async fn register(
        &self,
        request: &RegisterJobRequest,
    ) -> Result<RegisterJobResponse, ClientError> {
        AggregatorClient::register(self, request).await
    }
}

/// Delivers one tile task to a compute node.
#[async_trait]
pub trait TileTransport: Send + Sync {
    async fn send(&self, job_id: &str, task: &TileTask) -> Result<(), ClientError>;
}

/// Sends tiles to a worker over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTileTransport {
    worker: WorkerClient,
    /// Forwarded to the worker when set; otherwise the worker submits to
    /// its own configured aggregator.
    aggregator_url: Option<String>,
}

impl HttpTileTransport {
    pub fn new(worker: WorkerClient, aggregator_url: Option<String>) -> Self {
        Self {
            worker,
            aggregator_url,
        }
    }
}

#[async_trait]
impl TileTransport for HttpTileTransport {
    async fn send(&self, job_id: &str, task: &TileTask) -> Result<(), ClientError> {
        self.worker
            .multiply(job_id, task, self.aggregator_url.as_deref())
            .await
            .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Errors and report
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The aggregator did not accept the job; no tile was sent.
    #[error("Job registration failed: {0}")]
    Registration(#[source] ClientError),
}

/// Why a single send attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum TaskFailure {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
}

impl TaskFailure {
    pub fn is_retryable(&self) -> bool {
        match self {
            TaskFailure::Client(e) => e.is_retryable(),
            TaskFailure::TimedOut(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Whether the registration created the job (`false` for a known id).
    pub created: bool,
    pub dispatched: usize,
    /// Tiles that could not be delivered, in `(i, j, k)` order.
    pub failed_tiles: Vec<TileCoord>,
}

impl DispatchReport {
    pub fn failed(&self) -> usize {
        self.failed_tiles.len()
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    registrar: Arc<dyn JobRegistrar>,
    transport: Arc<dyn TileTransport>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        registrar: Arc<dyn JobRegistrar>,
        transport: Arc<dyn TileTransport>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registrar,
            transport,
            config,
        }
    }

    /// Register `job_id`, then send every task of `decomposition`.
    ///
    /// Returns once every task has either been delivered or given up on.
    pub async fn dispatch(
        &self,
        job_id: &str,
        decomposition: &Decomposition<'_>,
    ) -> Result<DispatchReport, DispatchError> {
        let grid = decomposition.grid();
        let registration = RegisterJobRequest {
            job_id: job_id.to_string(),
            expected_tiles: grid.expected_tiles(),
            row_tiles: grid.row_tiles(),
            col_tiles: grid.col_tiles(),
        };

        let registered = match self.registrar.register(&registration).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(job_id, error = %e, "Job registration failed, nothing dispatched");
                return Err(DispatchError::Registration(e));
            }
        };
        tracing::info!(
            job_id,
            expected = registered.expected,
            created = registered.created,
            pool_size = self.config.pool_size,
            "Job registered, dispatching tiles"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.pool_size.max(1)));
        let job_id_shared: Arc<str> = Arc::from(job_id);
        let mut in_flight = JoinSet::new();
        let mut pending: BTreeSet<TileCoord> = BTreeSet::new();
        let mut failed_tiles = Vec::new();
        let mut dispatched = 0;

        for coord in grid.coords() {
            // Wait for a free slot before materialising more work.
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                failed_tiles.push(coord);
                continue;
            };
            while let Some(joined) = in_flight.try_join_next() {
                record(joined, &mut pending, &mut dispatched, &mut failed_tiles);
            }

            let task = match decomposition.task(coord) {
                Ok(task) => task,
                Err(e) => {
                    tracing::warn!(job_id, %coord, error = %e, "Could not build tile task");
                    failed_tiles.push(coord);
                    continue;
                }
            };

            pending.insert(coord);
            let transport = Arc::clone(&self.transport);
            let task_job_id = Arc::clone(&job_id_shared);
            let config = self.config.clone();
            in_flight.spawn(async move {
                let outcome = send_with_retry(transport.as_ref(), &task_job_id, &task, &config).await;
                drop(permit);
                (task.coord, outcome)
            });
        }

        while let Some(joined) = in_flight.join_next().await {
            record(joined, &mut pending, &mut dispatched, &mut failed_tiles);
        }
        // Anything still pending belonged to a task that panicked.
        failed_tiles.extend(pending);
        failed_tiles.sort_unstable();

        let report = DispatchReport {
            created: registered.created,
            dispatched,
            failed_tiles,
        };
        if report.failed_tiles.is_empty() {
            tracing::info!(job_id, dispatched, "Dispatch complete");
        } else {
            tracing::warn!(
                job_id,
                dispatched,
                failed = report.failed(),
                "Dispatch complete with undelivered tiles; job will not become ready"
            );
        }
        Ok(report)
    }
}

fn record(
    joined: Result<(TileCoord, Result<(), TaskFailure>), tokio::task::JoinError>,
    pending: &mut BTreeSet<TileCoord>,
    dispatched: &mut usize,
    failed_tiles: &mut Vec<TileCoord>,
) {
    match joined {
        Ok((coord, Ok(()))) => {
            pending.remove(&coord);
            *dispatched += 1;
        }
        Ok((coord, Err(_))) => {
            pending.remove(&coord);
            failed_tiles.push(coord);
        }
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task aborted");
        }
    }
}

/// Send one task, retrying retryable failures with exponential backoff.
async fn send_with_retry(
    transport: &dyn TileTransport,
    job_id: &str,
    task: &TileTask,
    config: &DispatchConfig,
) -> Result<(), TaskFailure> {
    let coord = task.coord;
    let mut attempt: u32 = 0;
    loop {
        let outcome = match tokio::time::timeout(config.task_timeout, transport.send(job_id, task)).await {
            Ok(result) => result.map_err(TaskFailure::from),
            Err(_) => Err(TaskFailure::TimedOut(config.task_timeout)),
        };

        let failure = match outcome {
            Ok(()) => return Ok(()),
            Err(failure) => failure,
        };

        if attempt >= config.max_retries || !failure.is_retryable() {
            tracing::warn!(
                job_id,
                i = coord.i,
                j = coord.j,
                k = coord.k,
                attempts = attempt + 1,
                error = %failure,
                "Tile dispatch failed",
            );
            return Err(failure);
        }

        let delay = config.retry_backoff.saturating_mul(1u32 << attempt.min(16));
        tracing::debug!(
            job_id,
            i = coord.i,
            j = coord.j,
            k = coord.k,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %failure,
            "Tile dispatch failed, retrying",
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
