//! Scan service: the transport-agnostic inbound API
//!
//! Admits scan requests onto a bounded worker pool, and exposes status,
//! cancellation, report retrieval, and progress subscription. Each admitted
//! job runs on one worker end-to-end; workers are bounded by
//! `scanner.worker_threads` with `scanner.queue_size` jobs allowed to wait.

use super::events::{Notifier, ProgressEvent};
use super::manager::JobManager;
use crate::adapters::database::{self, Connector, MetadataExtractor, Sampler};
use crate::adapters::ner::NerClient;
use crate::adapters::notify::{BroadcastNotifier, CompositeNotifier, LogNotifier};
use crate::adapters::repository::Repository;
use crate::config::{ArgusConfig, DetectionConfig, SamplingConfig};
use crate::core::detection::DetectionCache;
use crate::core::scan::ScanExecutor;
use crate::domain::{
    ArgusError, ComplianceReport, ConnectionId, JobId, JobStatus, JobView, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};

/// One inbound scan request
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Configured connection to scan
    pub connection_id: String,

    /// Optional restriction to specific tables
    pub target_tables: Vec<String>,

    /// Detection overrides; the service defaults apply when unset
    pub detection: Option<DetectionConfig>,

    /// Sampling overrides; the service defaults apply when unset
    pub sampling: Option<SamplingConfig>,
}

/// Scan job admission and lifecycle API
pub struct ScanService {
    config: ArgusConfig,
    job_manager: Arc<JobManager>,
    executor: Arc<ScanExecutor>,
    broadcast: Arc<BroadcastNotifier>,
    cache: Arc<DetectionCache>,
    worker_permits: Arc<Semaphore>,
    admitted: Arc<AtomicUsize>,
    active_detection: Mutex<DetectionConfig>,
}

impl ScanService {
    /// Creates a service with the PostgreSQL adapter set
    ///
    /// Probes the NER service once when it is enabled; a failed probe leaves
    /// NER degraded without failing startup.
    pub async fn new(config: ArgusConfig, repository: Arc<dyn Repository>) -> Result<Self> {
        let (connector, metadata_extractor, sampler) =
            database::create_adapters(config.connections.clone());

        let ner_client = if config.ner.enabled {
            let client = Arc::new(
                NerClient::new(config.ner.clone())
                    .map_err(|e| ArgusError::Configuration(e.to_string()))?,
            );
            client.probe().await;
            Some(client)
        } else {
            None
        };

        Ok(Self::with_collaborators(
            config,
            repository,
            connector,
            metadata_extractor,
            sampler,
            ner_client,
        ))
    }

    /// Creates a service over explicit collaborators (used by tests)
    pub fn with_collaborators(
        config: ArgusConfig,
        repository: Arc<dyn Repository>,
        connector: Arc<dyn Connector>,
        metadata_extractor: Arc<dyn MetadataExtractor>,
        sampler: Arc<dyn Sampler>,
        ner_client: Option<Arc<NerClient>>,
    ) -> Self {
        let broadcast = Arc::new(BroadcastNotifier::new());
        let notifier: Arc<dyn Notifier> = Arc::new(CompositeNotifier::new(vec![
            Arc::new(LogNotifier::new()),
            broadcast.clone(),
        ]));
        let job_manager = Arc::new(JobManager::new(repository, notifier));
        let cache = Arc::new(DetectionCache::new());

        let executor = Arc::new(ScanExecutor::new(
            connector,
            metadata_extractor,
            sampler,
            job_manager.clone(),
            cache.clone(),
            ner_client,
        ));

        let worker_permits = Arc::new(Semaphore::new(config.scanner.worker_threads));
        let active_detection = Mutex::new(config.detection.clone());

        Self {
            config,
            job_manager,
            executor,
            broadcast,
            cache,
            worker_permits,
            admitted: Arc::new(AtomicUsize::new(0)),
            active_detection,
        }
    }

    /// Handle to the job manager
    pub fn job_manager(&self) -> &Arc<JobManager> {
        &self.job_manager
    }

    /// Admits a scan and returns its job id
    ///
    /// # Errors
    ///
    /// Returns [`ArgusError::InvalidInput`] for a missing or unknown
    /// connection id or a malformed configuration override; the job is not
    /// created in that case.
    pub async fn start_scan(&self, request: ScanRequest) -> Result<JobId> {
        if request.connection_id.trim().is_empty() {
            return Err(ArgusError::InvalidInput(
                "connection id is required".to_string(),
            ));
        }
        if self.config.find_connection(&request.connection_id).is_none() {
            return Err(ArgusError::InvalidInput(format!(
                "unknown connection id '{}'",
                request.connection_id
            )));
        }

        let detection = request
            .detection
            .unwrap_or_else(|| self.config.detection.clone());
        detection
            .validate()
            .map_err(ArgusError::InvalidInput)?;
        let sampling = request
            .sampling
            .unwrap_or_else(|| self.config.sampling.clone());
        sampling.validate().map_err(ArgusError::InvalidInput)?;

        self.flush_cache_on_config_change(&detection);

        let capacity = self.config.scanner.worker_threads + self.config.scanner.queue_size;
        if self.admitted.load(Ordering::SeqCst) >= capacity {
            return Err(ArgusError::Other(format!(
                "scan queue is full ({capacity} jobs admitted)"
            )));
        }

        let connection_id = ConnectionId::new(request.connection_id)
            .map_err(ArgusError::InvalidInput)?;
        let job = self
            .job_manager
            .create_job(connection_id, request.target_tables, detection, sampling)
            .await?;

        self.admitted.fetch_add(1, Ordering::SeqCst);
        self.spawn_worker(job.id.clone());

        Ok(job.id)
    }

    /// Read-only job snapshot
    pub async fn get_job_status(&self, job_id: &JobId) -> Result<JobView> {
        self.job_manager.get_status(job_id).await
    }

    /// Requests cancellation; the worker aborts at the next phase boundary
    pub async fn cancel_job(&self, job_id: &JobId) -> Result<JobView> {
        let job = self.job_manager.cancel_job(job_id).await?;
        Ok(JobView::from(&job))
    }

    /// Fetches a completed job's report
    ///
    /// # Errors
    ///
    /// Fails unless the job status is COMPLETED.
    pub async fn get_report(&self, job_id: &JobId) -> Result<ComplianceReport> {
        let job = self.job_manager.get_job(job_id).await?;
        if job.status != JobStatus::Completed {
            return Err(ArgusError::InvalidInput(format!(
                "report for job {job_id} is not available: status is {}",
                job.status
            )));
        }
        self.job_manager
            .repository()
            .find_report_by_job_id(job_id)
            .await?
            .ok_or_else(|| ArgusError::Report(format!("no report stored for job {job_id}")))
    }

    /// Subscribes to progress events; callers filter by job id
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressEvent> {
        self.broadcast.subscribe()
    }

    /// Waits until a job reaches a terminal state
    pub async fn wait_for_completion(&self, job_id: &JobId) -> Result<JobView> {
        loop {
            let view = self.get_job_status(job_id).await?;
            if view.status.is_terminal() {
                return Ok(view);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Flushes the shared detection cache when the active config changes
    fn flush_cache_on_config_change(&self, detection: &DetectionConfig) {
        let mut active = self
            .active_detection
            .lock()
            .expect("active detection lock poisoned");
        if *active != *detection {
            tracing::info!("Detection configuration changed, flushing detection cache");
            self.cache.invalidate_all();
            *active = detection.clone();
        }
    }

    fn spawn_worker(&self, job_id: JobId) {
        let permits = self.worker_permits.clone();
        let executor = self.executor.clone();
        let admitted = self.admitted.clone();

        tokio::spawn(async move {
            let _permit = match permits.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!(job_id = %job_id, "Worker pool closed before job started");
                    admitted.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };

            match executor.execute(&job_id).await {
                Ok(status) => {
                    tracing::info!(job_id = %job_id, status = %status, "Scan worker finished")
                }
                Err(e) => {
                    tracing::error!(job_id = %job_id, error = %e, "Scan worker failed terminally")
                }
            }
            admitted.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::repository::InMemoryRepository;

    async fn service_without_connections() -> ScanService {
        let mut config = ArgusConfig::default();
        config.ner.enabled = false;
        ScanService::new(config, Arc::new(InMemoryRepository::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_scan_requires_connection_id() {
        let service = service_without_connections().await;
        let err = service.start_scan(ScanRequest::default()).await.unwrap_err();
        assert!(matches!(err, ArgusError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_start_scan_rejects_unknown_connection() {
        let service = service_without_connections().await;
        let err = service
            .start_scan(ScanRequest {
                connection_id: "nope".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ArgusError::InvalidInput(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_invalid_detection_override_rejected() {
        let mut config = ArgusConfig::default();
        config.connections.push(crate::config::ConnectionConfig {
            id: "db".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            database: "app".to_string(),
            username: "argus".to_string(),
            password: None,
            tls: false,
            pool_size: 2,
        });
        let service = ScanService::new(config, Arc::new(InMemoryRepository::new()))
            .await
            .unwrap();

        let mut detection = DetectionConfig::default();
        detection.reporting_threshold = 2.0;
        let err = service
            .start_scan(ScanRequest {
                connection_id: "db".to_string(),
                detection: Some(detection),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ArgusError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_report_unavailable_for_unknown_job() {
        let service = service_without_connections().await;
        let err = service.get_report(&JobId::generate()).await.unwrap_err();
        assert!(matches!(err, ArgusError::JobNotFound(_)));
    }
}
