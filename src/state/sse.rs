use tokio::sync::broadcast;

use crate::dto::sse::TimerStreamEvent;

/// Per-event fan-out of timer changes to stream subscribers.
pub struct TimerHub {
    sender: broadcast::Sender<TimerStreamEvent>,
}

impl TimerHub {
    /// Hub whose subscribers may fall `capacity` items behind before lagging.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every item published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TimerStreamEvent> {
        self.sender.subscribe()
    }

    /// Deliver `event` to current subscribers. Returns how many received it; zero when nobody
    /// is listening.
    pub fn publish(&self, event: TimerStreamEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::dto::timer::RoundEndedEvent;

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let hub = TimerHub::new(4);
        let signal = TimerStreamEvent::RoundEnded(RoundEndedEvent {
            event_id: Uuid::new_v4(),
            round: 1,
        });
        assert_eq!(hub.publish(signal.clone()), 0);

        let mut rx = hub.subscribe();
        assert_eq!(hub.publish(signal.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), signal);
    }
}
