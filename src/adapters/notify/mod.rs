//! Notification channel implementations
//!
//! [`LogNotifier`] writes events to the tracing pipeline;
//! [`BroadcastNotifier`] fans them out to in-process subscribers and backs
//! the progress-subscription API. Both are best-effort.

use crate::core::jobs::events::{Notifier, ProgressEvent};
use tokio::sync::broadcast;

/// Default broadcast channel capacity
const DEFAULT_CAPACITY: usize = 256;

/// Notifier that logs every event
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates the notifier
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn publish(&self, event: &ProgressEvent) {
        tracing::info!(
            job_id = %event.job_id,
            status = %event.status,
            progress = event.progress_percent,
            message = %event.message,
            "Scan progress"
        );
    }
}

/// Notifier backed by a tokio broadcast channel
///
/// Send failures (no live subscribers, lagging receivers) are expected and
/// ignored; the channel only exists for interested listeners.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ProgressEvent>,
}

impl BroadcastNotifier {
    /// Creates a notifier with the default buffer capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a notifier with an explicit buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to all events; callers filter by job id
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, event: &ProgressEvent) {
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(job_id = %event.job_id, "No progress subscribers");
        }
    }
}

/// Fans one event out to several notifiers
pub struct CompositeNotifier {
    notifiers: Vec<std::sync::Arc<dyn Notifier>>,
}

impl CompositeNotifier {
    /// Creates a composite over the given notifiers
    pub fn new(notifiers: Vec<std::sync::Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }
}

impl Notifier for CompositeNotifier {
    fn publish(&self, event: &ProgressEvent) {
        for notifier in &self.notifiers {
            notifier.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobId, JobStatus};

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscriber() {
        let notifier = BroadcastNotifier::new();
        let mut receiver = notifier.subscribe();

        let event = ProgressEvent::phase_changed(JobId::generate(), JobStatus::Sampling);
        notifier.publish(&event);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.job_id, event.job_id);
        assert_eq!(received.status, JobStatus::Sampling);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let notifier = BroadcastNotifier::new();
        let event = ProgressEvent::phase_changed(JobId::generate(), JobStatus::Pending);
        // Must not panic or error
        notifier.publish(&event);
    }

    #[tokio::test]
    async fn test_per_job_ordering_preserved() {
        let notifier = BroadcastNotifier::new();
        let mut receiver = notifier.subscribe();
        let job_id = JobId::generate();

        for status in [
            JobStatus::ExtractingMetadata,
            JobStatus::Sampling,
            JobStatus::DetectingPii,
        ] {
            notifier.publish(&ProgressEvent::phase_changed(job_id.clone(), status));
        }

        let mut last_progress = 0;
        for _ in 0..3 {
            let event = receiver.recv().await.unwrap();
            assert!(event.progress_percent >= last_progress);
            last_progress = event.progress_percent;
        }
    }

    #[tokio::test]
    async fn test_composite_fans_out() {
        let broadcast = std::sync::Arc::new(BroadcastNotifier::new());
        let mut receiver = broadcast.subscribe();
        let composite = CompositeNotifier::new(vec![
            std::sync::Arc::new(LogNotifier::new()),
            broadcast.clone(),
        ]);

        composite.publish(&ProgressEvent::phase_changed(
            JobId::generate(),
            JobStatus::Completed,
        ));
        assert!(receiver.recv().await.is_ok());
    }
}
