//! End-of-round notification fan-out.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::dto::timer::RoundEndedEvent;

/// Capacity of the end-of-round broadcast channel.
const NOTIFICATION_CAPACITY: usize = 8;

/// Receives end-of-round signals synchronously, e.g. to play a sound.
pub trait NotificationSink: Send + Sync {
    /// Called once per round expiry.
    fn round_ended(&self, signal: RoundEndedEvent);
}

/// Fans end-of-round signals out to subscribers and sinks.
///
/// Deduplication happens upstream in the state machine; every call to [`emit`](Self::emit)
/// is delivered.
#[derive(Clone)]
pub struct NotificationEmitter {
    sender: broadcast::Sender<RoundEndedEvent>,
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl Default for NotificationEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationEmitter {
    /// Emitter without sinks.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            sender,
            sinks: Vec::new(),
        }
    }

    /// Also call `sink` for every signal.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Receive every signal emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RoundEndedEvent> {
        self.sender.subscribe()
    }

    /// Deliver `signal` to every sink and subscriber.
    pub fn emit(&self, signal: RoundEndedEvent) {
        info!(event_id = %signal.event_id, round = signal.round, "Round ended");
        for sink in &self.sinks {
            sink.round_ended(signal);
        }
        let _ = self.sender.send(signal);
    }
}
