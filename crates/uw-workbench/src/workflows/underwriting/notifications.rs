use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

use super::submission::SubmissionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Ingested,
    StageChanged,
    SubstageChanged,
    Assigned,
    AutoAssigned,
    ReviewRequired,
    FieldEdited,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::Ingested => "ingested",
            NotificationKind::StageChanged => "stage_changed",
            NotificationKind::SubstageChanged => "substage_changed",
            NotificationKind::Assigned => "assigned",
            NotificationKind::AutoAssigned => "auto_assigned",
            NotificationKind::ReviewRequired => "review_required",
            NotificationKind::FieldEdited => "field_edited",
        }
    }
}

/// Human-readable transition notice for whoever is watching the workbench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub submission_id: SubmissionId,
    pub kind: NotificationKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification buffer unavailable")]
    BufferUnavailable,
    #[error("notification transport error: {0}")]
    Transport(String),
}

/// Receives notifications emitted by the workbench. Delivery failures are reported
/// back but never undo the mutation that produced the notification.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifications {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifications {
    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl NotificationSink for MemoryNotifications {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| NotifyError::BufferUnavailable)?;
        events.push(notification);
        Ok(())
    }
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifications;

impl NotificationSink for TracingNotifications {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            submission = %notification.submission_id,
            kind = notification.kind.label(),
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Fans notifications out to live subscribers. Having no subscriber is not an error.
#[derive(Debug, Clone)]
pub struct BroadcastNotifications {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifications {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl NotificationSink for BroadcastNotifications {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender
            .send(notification)
            .map(|_| ())
            .map_err(|err| NotifyError::Transport(err.to_string()))
    }
}

/// Delivers to several sinks, reporting the first failure after trying all of them.
#[derive(Default, Clone)]
pub struct NotificationFanout {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl NotificationSink for NotificationFanout {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.notify(notification.clone()) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(message: &str) -> Notification {
        Notification {
            submission_id: SubmissionId("sub-0001".to_string()),
            kind: NotificationKind::StageChanged,
            message: message.to_string(),
            at: Utc::now(),
        }
    }

    #[test]
    fn broadcast_without_subscribers_is_accepted() {
        let sink = BroadcastNotifications::new(8);
        assert!(sink.notify(notification("no one listening")).is_ok());
    }

    #[test]
    fn fanout_delivers_to_every_sink() {
        let first = Arc::new(MemoryNotifications::default());
        let second = Arc::new(MemoryNotifications::default());
        let fanout = NotificationFanout::new()
            .with(first.clone())
            .with(second.clone());

        fanout.notify(notification("hello")).expect("delivered");

        assert_eq!(first.events().len(), 1);
        assert_eq!(second.drain().len(), 1);
        assert!(second.events().is_empty());
    }

    #[tokio::test]
    async fn broadcast_subscribers_receive_notifications() {
        let sink = BroadcastNotifications::new(8);
        let mut receiver = sink.subscribe();
        sink.notify(notification("moved")).expect("sent");

        let received = receiver.recv().await.expect("notification received");
        assert_eq!(received.message, "moved");
    }
}
