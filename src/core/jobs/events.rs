//! Progress events and the notification capability
//!
//! An event is published on every accepted state change and on intra-phase
//! progress callbacks. Publication is best-effort: a notifier failure is
//! logged and never propagated into the scan.

use crate::domain::{JobId, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a progress event announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressEventKind {
    /// The job entered a new phase
    PhaseChanged,
    /// The scan reached a terminal state
    ScanCompleted,
}

/// One progress notification for one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Job the event belongs to
    pub job_id: JobId,

    /// Event kind
    pub kind: ProgressEventKind,

    /// Status after the change
    pub status: JobStatus,

    /// Progress estimate derived from status
    pub progress_percent: u8,

    /// Human-readable detail
    pub message: String,

    /// Emission time
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Builds an event for a status change
    pub fn phase_changed(job_id: JobId, status: JobStatus) -> Self {
        Self {
            job_id,
            kind: if status.is_terminal() {
                ProgressEventKind::ScanCompleted
            } else {
                ProgressEventKind::PhaseChanged
            },
            status,
            progress_percent: status.progress_percent(),
            message: format!("job entered {status}"),
            timestamp: Utc::now(),
        }
    }

    /// Builds an event with a custom message
    pub fn with_message(job_id: JobId, status: JobStatus, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::phase_changed(job_id, status)
        }
    }
}

/// Pluggable notification channel
///
/// Implementations must preserve per-job ordering; events for different jobs
/// may interleave. `publish` is fire-and-forget.
pub trait Notifier: Send + Sync {
    /// Publishes one event, best-effort
    fn publish(&self, event: &ProgressEvent);
}
