use std::collections::BTreeMap;
use std::time::Duration;

use blockmul_core::protocol::{
    FinalResult, JobProgress, RegisterJobRequest, RegisterJobResponse, SubmitTileRequest,
    SubmitTileResponse,
};
use blockmul_core::types::JobId;

use crate::error::ClientError;
use crate::response::{normalize_base_url, parse_data};

/// HTTP client for the aggregator service.
#[derive(Debug, Clone)]
pub struct AggregatorClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AggregatorClient {
    /// Create a client with its own connection pool.
    ///
    /// * `base_url` - e.g. `http://aggregator:8002`.
    /// * `timeout` - applied to every request.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, timeout)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (and its
    /// connection pool).
    pub fn with_client(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/v1/jobs` -- register a job before any tile is dispatched.
    pub async fn register(
        &self,
        request: &RegisterJobRequest,
    ) -> Result<RegisterJobResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/v1/jobs", self.base_url))
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;
        parse_data(response).await
    }

    /// `POST /api/v1/jobs/{job_id}/tiles` -- submit one partial product.
    pub async fn submit_tile(
        &self,
        job_id: &str,
        request: &SubmitTileRequest,
    ) -> Result<SubmitTileResponse, ClientError> {
        tracing::debug!(job_id, i = request.i, j = request.j, k = request.k, "Submitting tile");
        let response = self
            .client
            .post(format!("{}/api/v1/jobs/{job_id}/tiles", self.base_url))
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;
        parse_data(response).await
    }

    /// `GET /api/v1/jobs/{job_id}/result` -- poll for the stitched result.
    pub async fn final_result(&self, job_id: &str) -> Result<FinalResult, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/v1/jobs/{job_id}/result", self.base_url))
            .timeout(self.timeout)
            .send()
            .await?;
        parse_data(response).await
    }

    /// `GET /api/v1/jobs` -- progress of every known job.
    pub async fn list_jobs(&self) -> Result<BTreeMap<JobId, JobProgress>, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/v1/jobs", self.base_url))
            .timeout(self.timeout)
            .send()
            .await?;
        parse_data(response).await
    }
}
