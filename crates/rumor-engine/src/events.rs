//! EventPublisher implementations

use parking_lot::Mutex;
use rumor_domain::traits::{EventPublisher, PublishError};
use rumor_domain::{RumorEvent, RumorEventKind};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Publisher that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: &RumorEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Publisher that logs every event at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
    fn publish(&self, event: &RumorEvent) -> Result<(), PublishError> {
        tracing::info!(
            event = event.kind.as_str(),
            rumor_id = %event.rumor_id,
            subject_id = ?event.subject_id.map(|id| id.to_string()),
            entity_id = ?event.entity_id.as_ref().map(|e| e.as_str()),
            details = ?event.details,
            "Rumor event"
        );
        Ok(())
    }
}

/// Publisher that fans events out to in-process subscribers
///
/// Sending never blocks; slow subscribers lag and lose the oldest events.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<RumorEvent>,
}

impl BroadcastPublisher {
    /// Create a publisher buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<RumorEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: &RumorEvent) -> Result<(), PublishError> {
        // No subscribers is not a delivery failure
        let _ = self.sender.send(event.clone());
        Ok(())
    }
}

/// Recording publisher for testing
///
/// Keeps every event in memory. Clones share the same log. A failing
/// recorder still records, then reports an error.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<RumorEvent>>>,
    fail: bool,
}

impl RecordingPublisher {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder whose every publish fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// All recorded events in publish order
    pub fn events(&self) -> Vec<RumorEvent> {
        self.events.lock().clone()
    }

    /// Kinds of all recorded events in publish order
    pub fn kinds(&self) -> Vec<RumorEventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }

    /// Recorded events of one kind
    pub fn of_kind(&self, kind: RumorEventKind) -> Vec<RumorEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Forget all recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: &RumorEvent) -> Result<(), PublishError> {
        self.events.lock().push(event.clone());
        if self.fail {
            return Err(PublishError("recording publisher set to fail".to_string()));
        }
        Ok(())
    }
}
