use std::time::Duration;

use blockmul_core::matrix::Matrix;
use blockmul_core::protocol::MultiplyTileResponse;
use blockmul_core::tiling::TileTask;
use serde::Serialize;

use crate::error::ClientError;
use crate::response::{normalize_base_url, parse_data};

/// HTTP client for a worker (compute) service.
#[derive(Debug, Clone)]
pub struct WorkerClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

/// Borrowed form of `MultiplyTileRequest` so a task can be re-sent
/// without cloning its sub-blocks.
#[derive(Serialize)]
struct MultiplyTileBody<'a> {
    job_id: &'a str,
    i: usize,
    j: usize,
    k: usize,
    sub_a: &'a Matrix,
    sub_b: &'a Matrix,
    #[serde(skip_serializing_if = "Option::is_none")]
    aggregator_url: Option<&'a str>,
}

impl WorkerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, timeout)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            timeout,
        }
    }

    /// `POST /api/v1/multiply` -- have the worker multiply one tile pair and
    /// forward the product to `aggregator_url` (or its configured default).
    pub async fn multiply(
        &self,
        job_id: &str,
        task: &TileTask,
        aggregator_url: Option<&str>,
    ) -> Result<MultiplyTileResponse, ClientError> {
        let body = MultiplyTileBody {
            job_id,
            i: task.coord.i,
            j: task.coord.j,
            k: task.coord.k,
            sub_a: &task.sub_a,
            sub_b: &task.sub_b,
            aggregator_url,
        };
        let response = self
            .client
            .post(format!("{}/api/v1/multiply", self.base_url))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;
        parse_data(response).await
    }
}
