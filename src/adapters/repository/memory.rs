//! In-memory repository
//!
//! The default store for single-process runs and the test suites. All maps
//! sit behind one async RwLock per collection; the job manager layers its
//! own per-job serialization on top.

use super::Repository;
use crate::domain::{
    ArgusError, ComplianceReport, DetectionResult, Job, JobId, QuasiIdentifierGroup, Result,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory implementation of [`Repository`]
#[derive(Default)]
pub struct InMemoryRepository {
    jobs: RwLock<HashMap<JobId, Job>>,
    results: RwLock<HashMap<JobId, Vec<DetectionResult>>>,
    qi_groups: RwLock<HashMap<JobId, Vec<QuasiIdentifierGroup>>>,
    reports: RwLock<HashMap<JobId, ComplianceReport>>,
}

impl InMemoryRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn save_job(&self, job: &Job) -> Result<()> {
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn update_job(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if !jobs.contains_key(&job.id) {
            return Err(ArgusError::JobNotFound(job.id.to_string()));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn find_job(&self, job_id: &JobId) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.get(job_id).cloned())
    }

    async fn save_detection_results(
        &self,
        job_id: &JobId,
        results: &[DetectionResult],
    ) -> Result<()> {
        self.results
            .write()
            .await
            .insert(job_id.clone(), results.to_vec());
        Ok(())
    }

    async fn find_detection_results(&self, job_id: &JobId) -> Result<Vec<DetectionResult>> {
        Ok(self
            .results
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_qi_group(&self, group: &QuasiIdentifierGroup) -> Result<()> {
        self.qi_groups
            .write()
            .await
            .entry(group.job_id.clone())
            .or_default()
            .push(group.clone());
        Ok(())
    }

    async fn find_qi_groups(&self, job_id: &JobId) -> Result<Vec<QuasiIdentifierGroup>> {
        Ok(self
            .qi_groups
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_report(&self, report: &ComplianceReport) -> Result<()> {
        self.reports
            .write()
            .await
            .insert(report.job_id.clone(), report.clone());
        Ok(())
    }

    async fn find_report_by_job_id(&self, job_id: &JobId) -> Result<Option<ComplianceReport>> {
        Ok(self.reports.read().await.get(job_id).cloned())
    }
}
