//! In-memory job registry.
//!
//! The map of jobs sits behind one `RwLock` that is held only long enough
//! to look up or insert an entry. Each job's accumulation state has its
//! own `Mutex`, so submissions for different jobs never contend and
//! submissions for the same job are serialized.
//!
//! Accumulation and stitching are CPU-bound, so they run on the blocking
//! pool with the job's lock guard moved into the closure.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use blockmul_core::error::CoreError;
use blockmul_core::matrix::Matrix;
use blockmul_core::protocol::{FinalResult, JobProgress, RegisterJobRequest};
use blockmul_core::types::{JobId, TileCoord, Timestamp};
use tokio::sync::{Mutex, RwLock};

use crate::job::{JobConfig, JobRecord, SubmitOutcome};

/// Outcome of [`JobRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub config: JobConfig,
    /// `false` when the job already existed and was left untouched.
    pub created: bool,
}

struct JobEntry {
    /// Copy of the record's config, readable without taking the job lock.
    config: JobConfig,
    record: Arc<Mutex<JobRecord>>,
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job. Re-registering an existing id returns its original
    /// configuration and keeps all progress.
    pub async fn register(&self, request: &RegisterJobRequest) -> Result<Registration, CoreError> {
        request.validate()?;

        let mut jobs = self.jobs.write().await;
        if let Some(entry) = jobs.get(&request.job_id) {
            return Ok(Registration {
                config: entry.config.clone(),
                created: false,
            });
        }

        let config = JobConfig::from_request(request);
        let entry = JobEntry {
            config: config.clone(),
            record: Arc::new(Mutex::new(JobRecord::new(config.clone()))),
        };
        jobs.insert(request.job_id.clone(), Arc::new(entry));
        Ok(Registration {
            config,
            created: true,
        })
    }

    async fn entry(&self, job_id: &str) -> Result<Arc<JobEntry>, CoreError> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownJob(job_id.to_string()))
    }

    /// Run `f` on the blocking pool while holding the job's lock.
    async fn with_record_blocking<T, F>(&self, job_id: &str, f: F) -> Result<T, CoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut JobRecord) -> Result<T, CoreError> + Send + 'static,
    {
        let entry = self.entry(job_id).await?;
        let mut record = Arc::clone(&entry.record).lock_owned().await;
        tokio::task::spawn_blocking(move || f(&mut *record))
            .await
            .map_err(|e| CoreError::Internal(format!("Job {job_id} task failed: {e}")))?
    }

    /// Accumulate one partial product under the job's lock.
    pub async fn submit(
        &self,
        job_id: &str,
        coord: TileCoord,
        product: Matrix,
        duration_sec: f64,
    ) -> Result<SubmitOutcome, CoreError> {
        self.with_record_blocking(job_id, move |record| {
            record.submit(coord, &product, duration_sec)
        })
        .await
    }

    pub async fn final_result(
        &self,
        job_id: &str,
        summary_threshold: usize,
    ) -> Result<FinalResult, CoreError> {
        self.with_record_blocking(job_id, move |record| record.final_result(summary_threshold))
            .await
    }

    pub async fn progress(&self, job_id: &str) -> Result<JobProgress, CoreError> {
        let entry = self.entry(job_id).await?;
        let record = entry.record.lock().await;
        Ok(record.progress())
    }

    /// Progress of every job, ordered by id.
    pub async fn list(&self) -> BTreeMap<JobId, JobProgress> {
        let entries: Vec<Arc<JobEntry>> = self.jobs.read().await.values().cloned().collect();
        let mut out = BTreeMap::new();
        for entry in entries {
            let progress = entry.record.lock().await.progress();
            out.insert(entry.config.job_id.clone(), progress);
        }
        out
    }

    /// Remove every job registered before `cutoff`, returning their ids.
    pub async fn remove_older_than(&self, cutoff: Timestamp) -> Vec<JobId> {
        let mut jobs = self.jobs.write().await;
        let expired: Vec<JobId> = jobs
            .values()
            .filter(|entry| entry.config.registered_at < cutoff)
            .map(|entry| entry.config.job_id.clone())
            .collect();
        for job_id in &expired {
            jobs.remove(job_id);
        }
        expired
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}
