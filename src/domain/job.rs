//! Scan job entity and lifecycle state machine
//!
//! A job tracks one scan of one database connection from admission to a
//! terminal state. Transitions follow a fixed DAG; terminal states are
//! immutable and attempts to leave them are rejected without side effects.

use crate::config::{DetectionConfig, SamplingConfig};
use crate::domain::errors::ArgusError;
use crate::domain::ids::{ConnectionId, JobId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scan job status
///
/// The pipeline states are entered in order; `Failed` and `Cancelled` are
/// reachable from any non-terminal state. No state is ever re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Admitted, not yet picked up by a worker
    Pending,
    /// Reading schema metadata from the target database
    ExtractingMetadata,
    /// Sampling column values
    Sampling,
    /// Running the detection pipeline per column
    DetectingPii,
    /// Correlating columns and extracting quasi-identifier groups
    AnalyzingQi,
    /// Assembling and persisting the compliance report
    GeneratingReport,
    /// Scan finished; report available
    Completed,
    /// Scan aborted with an error message
    Failed,
    /// Scan cancelled by the caller
    Cancelled,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions permitted)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// The single legal pipeline successor, if any
    fn pipeline_successor(&self) -> Option<JobStatus> {
        match self {
            Self::Pending => Some(Self::ExtractingMetadata),
            Self::ExtractingMetadata => Some(Self::Sampling),
            Self::Sampling => Some(Self::DetectingPii),
            Self::DetectingPii => Some(Self::AnalyzingQi),
            Self::AnalyzingQi => Some(Self::GeneratingReport),
            Self::GeneratingReport => Some(Self::Completed),
            Self::Completed | Self::Failed | Self::Cancelled => None,
        }
    }

    /// Checks whether a transition to `next` is legal
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Failed || next == Self::Cancelled {
            return true;
        }
        self.pipeline_successor() == Some(next)
    }

    /// Coarse progress estimate derived from state
    pub fn progress_percent(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::ExtractingMetadata => 10,
            Self::Sampling => 30,
            Self::DetectingPii => 60,
            Self::AnalyzingQi => 70,
            Self::GeneratingReport => 85,
            Self::Completed | Self::Failed | Self::Cancelled => 100,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::ExtractingMetadata => "EXTRACTING_METADATA",
            Self::Sampling => "SAMPLING",
            Self::DetectingPii => "DETECTING_PII",
            Self::AnalyzingQi => "ANALYZING_QI",
            Self::GeneratingReport => "GENERATING_REPORT",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// One scan job
///
/// Owns the configuration snapshot taken at admission, the lifecycle
/// timestamps, and the running counters. Counters never decrease within a
/// job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job id
    pub id: JobId,

    /// Connection the scan runs against
    pub connection_id: ConnectionId,

    /// Current lifecycle state
    pub status: JobStatus,

    /// Creation time
    pub start_time: DateTime<Utc>,

    /// Set exactly when the job enters a terminal state
    pub end_time: Option<DateTime<Utc>>,

    /// Stamped on every accepted transition
    pub last_update_time: DateTime<Utc>,

    /// Failure detail; only set for FAILED jobs
    pub error_message: Option<String>,

    /// Catalog name populated during metadata extraction
    pub database_name: Option<String>,

    /// Database product name populated during metadata extraction
    pub database_product_name: Option<String>,

    /// Database product version populated during metadata extraction
    pub database_product_version: Option<String>,

    /// Number of columns covered by the scan
    pub total_columns_scanned: usize,

    /// Number of columns with at least one surviving PII candidate
    pub total_pii_columns_found: usize,

    /// Number of columns that belong to a quasi-identifier group
    pub total_quasi_identifier_columns_found: usize,

    /// Optional restriction to a set of tables; empty scans everything
    pub target_tables: Vec<String>,

    /// Detection configuration snapshot taken at admission
    pub detection: DetectionConfig,

    /// Sampling configuration snapshot taken at admission
    pub sampling: SamplingConfig,
}

impl Job {
    /// Creates a new PENDING job with a configuration snapshot
    pub fn new(
        connection_id: ConnectionId,
        target_tables: Vec<String>,
        detection: DetectionConfig,
        sampling: SamplingConfig,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::generate(),
            connection_id,
            status: JobStatus::Pending,
            start_time: now,
            end_time: None,
            last_update_time: now,
            error_message: None,
            database_name: None,
            database_product_name: None,
            database_product_version: None,
            total_columns_scanned: 0,
            total_pii_columns_found: 0,
            total_quasi_identifier_columns_found: 0,
            target_tables,
            detection,
            sampling,
        }
    }

    /// Applies a status transition, enforcing the lifecycle DAG
    ///
    /// Stamps `last_update_time`, and `end_time` when the new state is
    /// terminal. On rejection the job is left completely unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ArgusError::IllegalStateTransition`] if the transition is
    /// not permitted.
    pub fn transition_to(&mut self, next: JobStatus) -> Result<(), ArgusError> {
        if !self.status.can_transition_to(next) {
            return Err(ArgusError::IllegalStateTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        let now = Utc::now();
        self.last_update_time = now;
        if next.is_terminal() {
            self.end_time = Some(now);
        }
        Ok(())
    }

    /// Marks the job FAILED with a message
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), ArgusError> {
        self.transition_to(JobStatus::Failed)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Marks the job CANCELLED
    pub fn cancel(&mut self) -> Result<(), ArgusError> {
        self.transition_to(JobStatus::Cancelled)
    }

    /// Marks the job COMPLETED
    pub fn complete(&mut self) -> Result<(), ArgusError> {
        self.transition_to(JobStatus::Completed)
    }

    /// Records the scanned-column count; counters never decrease
    pub fn record_columns_scanned(&mut self, count: usize) {
        self.total_columns_scanned = self.total_columns_scanned.max(count);
    }

    /// Records the PII-column count; counters never decrease
    pub fn record_pii_columns_found(&mut self, count: usize) {
        self.total_pii_columns_found = self.total_pii_columns_found.max(count);
    }

    /// Records the QI-column count; counters never decrease
    pub fn record_qi_columns_found(&mut self, count: usize) {
        self.total_quasi_identifier_columns_found =
            self.total_quasi_identifier_columns_found.max(count);
    }

    /// Elapsed wall-clock time between start and end, if the job is done
    pub fn duration_millis(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }
}

/// Read-only job snapshot returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    /// Job id
    pub id: JobId,
    /// Connection the scan runs against
    pub connection_id: ConnectionId,
    /// Current status
    pub status: JobStatus,
    /// Progress estimate derived from status
    pub progress_percent: u8,
    /// Creation time
    pub start_time: DateTime<Utc>,
    /// Terminal time, if reached
    pub end_time: Option<DateTime<Utc>>,
    /// Failure detail, if failed
    pub error_message: Option<String>,
    /// Columns covered so far
    pub total_columns_scanned: usize,
    /// PII columns found so far
    pub total_pii_columns_found: usize,
    /// Quasi-identifier columns found so far
    pub total_quasi_identifier_columns_found: usize,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            connection_id: job.connection_id.clone(),
            status: job.status,
            progress_percent: job.status.progress_percent(),
            start_time: job.start_time,
            end_time: job.end_time,
            error_message: job.error_message.clone(),
            total_columns_scanned: job.total_columns_scanned,
            total_pii_columns_found: job.total_pii_columns_found,
            total_quasi_identifier_columns_found: job.total_quasi_identifier_columns_found,
        }
    }
}
