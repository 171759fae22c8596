//! Scan state persistence
//!
//! The repository owns jobs, detection results, quasi-identifier groups, and
//! reports. Operations are transactional at the single-call level; callers
//! serialize per-job updates themselves.

pub mod memory;

use crate::domain::{
    ComplianceReport, DetectionResult, Job, JobId, QuasiIdentifierGroup, Result,
};
use async_trait::async_trait;

pub use memory::InMemoryRepository;

/// Persistence operations for scan state
#[async_trait]
pub trait Repository: Send + Sync {
    /// Persists a new job
    async fn save_job(&self, job: &Job) -> Result<()>;

    /// Updates an existing job
    async fn update_job(&self, job: &Job) -> Result<()>;

    /// Fetches a job by id
    async fn find_job(&self, job_id: &JobId) -> Result<Option<Job>>;

    /// Persists a job's detection results, replacing any previous set
    async fn save_detection_results(
        &self,
        job_id: &JobId,
        results: &[DetectionResult],
    ) -> Result<()>;

    /// Fetches a job's detection results
    async fn find_detection_results(&self, job_id: &JobId) -> Result<Vec<DetectionResult>>;

    /// Persists one quasi-identifier group
    async fn save_qi_group(&self, group: &QuasiIdentifierGroup) -> Result<()>;

    /// Fetches a job's quasi-identifier groups
    async fn find_qi_groups(&self, job_id: &JobId) -> Result<Vec<QuasiIdentifierGroup>>;

    /// Persists a compliance report
    async fn save_report(&self, report: &ComplianceReport) -> Result<()>;

    /// Fetches a job's report, if one was generated
    async fn find_report_by_job_id(&self, job_id: &JobId) -> Result<Option<ComplianceReport>>;
}
