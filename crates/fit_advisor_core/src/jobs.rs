//! crates/fit_advisor_core/src/jobs.rs
//!
//! The try-on job state machine, persisted in the key-value store.
//!
//! A job is written once as `processing` and once more when it reaches
//! `completed` or `failed`. Every write resets the one hour expiry; reads
//! never do.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::domain::{JobMetadata, JobStatus, TryOnJob, TryOnResult};
use crate::ports::{KeyValueStore, PortError, PortResult};

/// How long a job stays readable after its last write.
pub const JOB_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct JobStore {
    kv: Arc<dyn KeyValueStore>,
}

impl JobStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn key(job_id: &str) -> String {
        format!("job:{}", job_id)
    }

    async fn write(&self, job: &TryOnJob) -> PortResult<()> {
        let value =
            serde_json::to_string(job).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.kv.set(&Self::key(&job.job_id), &value, JOB_TTL).await
    }

    /// Records a new job in the `processing` state.
    pub async fn create(&self, job_id: &str, metadata: JobMetadata) -> PortResult<TryOnJob> {
        let job = TryOnJob {
            job_id: job_id.to_string(),
            status: JobStatus::Processing,
            product_id: metadata.product_id,
            created_at: Utc::now(),
            finished_at: None,
            result: None,
            error: None,
        };
        self.write(&job).await?;
        info!("Created try-on job {}", job_id);
        Ok(job)
    }

    /// Reads a job. Unknown and expired jobs are both `NotFound`.
    pub async fn get(&self, job_id: &str) -> PortResult<TryOnJob> {
        let raw = self
            .kv
            .get(&Self::key(job_id))
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Job {} not found", job_id)))?;
        serde_json::from_str(&raw).map_err(|e| {
            error!("Stored job {} is corrupt: {}", job_id, e);
            PortError::Unexpected(format!("Stored job {} is corrupt", job_id))
        })
    }

    /// Moves a processing job to `completed` with its result.
    pub async fn complete(&self, job_id: &str, result: TryOnResult) -> PortResult<TryOnJob> {
        self.finish(job_id, JobStatus::Completed, |job| job.result = Some(result))
            .await
    }

    /// Moves a processing job to `failed` with an error message.
    pub async fn fail(&self, job_id: &str, error: impl Into<String>) -> PortResult<TryOnJob> {
        let error = error.into();
        self.finish(job_id, JobStatus::Failed, |job| job.error = Some(error))
            .await
    }

    async fn finish<F>(&self, job_id: &str, status: JobStatus, fill: F) -> PortResult<TryOnJob>
    where
        F: FnOnce(&mut TryOnJob) + Send,
    {
        let mut job = self.get(job_id).await?;
        if job.status.is_terminal() {
            return Err(PortError::IllegalTransition {
                job_id: job_id.to_string(),
                status: job.status,
            });
        }
        job.status = status;
        job.finished_at = Some(Utc::now());
        fill(&mut job);
        self.write(&job).await?;
        info!("Try-on job {} is now {}", job_id, status);
        Ok(job)
    }
}
