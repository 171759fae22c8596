//! Job manager
//!
//! Owns the job lifecycle: creation, checked status transitions, terminal
//! transitions, and event emission. Store updates are serialized per job id
//! so a cancel racing a phase transition can never interleave half-written
//! state.

use super::events::{Notifier, ProgressEvent};
use crate::adapters::repository::Repository;
use crate::config::{DetectionConfig, SamplingConfig};
use crate::domain::{ArgusError, ConnectionId, Job, JobId, JobStatus, JobView, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Manages scan jobs against the repository and notification channel
pub struct JobManager {
    repository: Arc<dyn Repository>,
    notifier: Arc<dyn Notifier>,
    locks: Mutex<HashMap<JobId, Arc<tokio::sync::Mutex<()>>>>,
}

impl JobManager {
    /// Creates a manager
    pub fn new(repository: Arc<dyn Repository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle to the repository
    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    /// Creates and persists a PENDING job with its configuration snapshot
    pub async fn create_job(
        &self,
        connection_id: ConnectionId,
        target_tables: Vec<String>,
        detection: DetectionConfig,
        sampling: SamplingConfig,
    ) -> Result<Job> {
        let job = Job::new(connection_id, target_tables, detection, sampling);
        self.repository.save_job(&job).await?;
        tracing::info!(
            job_id = %job.id,
            connection = %job.connection_id,
            "Scan job created"
        );
        Ok(job)
    }

    /// Fetches a job
    ///
    /// # Errors
    ///
    /// Returns [`ArgusError::JobNotFound`] for an unknown id.
    pub async fn get_job(&self, job_id: &JobId) -> Result<Job> {
        self.repository
            .find_job(job_id)
            .await?
            .ok_or_else(|| ArgusError::JobNotFound(job_id.to_string()))
    }

    /// Read-only snapshot of a job
    pub async fn get_status(&self, job_id: &JobId) -> Result<JobView> {
        Ok(JobView::from(&self.get_job(job_id).await?))
    }

    /// Transitions a job to a new status, emitting a progress event
    ///
    /// An illegal transition leaves the job unchanged and emits nothing.
    pub async fn update_status(&self, job_id: &JobId, next: JobStatus) -> Result<Job> {
        self.mutate(job_id, |job| job.transition_to(next)).await
    }

    /// Terminal transition to COMPLETED
    pub async fn complete_job(&self, job_id: &JobId) -> Result<Job> {
        self.mutate(job_id, |job| job.complete()).await
    }

    /// Terminal transition to FAILED with an error message
    pub async fn fail_job(&self, job_id: &JobId, message: impl Into<String>) -> Result<Job> {
        let message = message.into();
        self.mutate(job_id, move |job| job.fail(message)).await
    }

    /// Terminal transition to CANCELLED
    pub async fn cancel_job(&self, job_id: &JobId) -> Result<Job> {
        self.mutate(job_id, |job| job.cancel()).await
    }

    /// Updates job fields that don't change the lifecycle state
    ///
    /// Used for the metadata and counter updates inside a phase; no event is
    /// emitted.
    pub async fn update_job_fields(
        &self,
        job_id: &JobId,
        update: impl FnOnce(&mut Job) + Send,
    ) -> Result<Job> {
        let lock = self.job_lock(job_id);
        let _guard = lock.lock().await;

        let mut job = self.get_job(job_id).await?;
        update(&mut job);
        self.repository.update_job(&job).await?;
        Ok(job)
    }

    /// Applies a checked transition under the per-job lock and publishes
    async fn mutate(
        &self,
        job_id: &JobId,
        apply: impl FnOnce(&mut Job) -> std::result::Result<(), ArgusError> + Send,
    ) -> Result<Job> {
        let lock = self.job_lock(job_id);
        let _guard = lock.lock().await;

        let mut job = self.get_job(job_id).await?;
        let previous = job.status;
        apply(&mut job)?;
        self.repository.update_job(&job).await?;

        tracing::info!(
            job_id = %job.id,
            from = %previous,
            to = %job.status,
            "Job status updated"
        );
        self.notifier
            .publish(&ProgressEvent::phase_changed(job.id.clone(), job.status));

        Ok(job)
    }

    fn job_lock(&self, job_id: &JobId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("job lock map poisoned");
        locks
            .entry(job_id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
