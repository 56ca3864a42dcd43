use tokio::sync::broadcast;
use tracing::trace;

use crate::dto::sse::ServerEvent;

/// Fan-out channel carrying the events of a single room.
pub struct RoomEventHub {
    room_id: String,
    sender: broadcast::Sender<ServerEvent>,
}

impl RoomEventHub {
    /// Hub for `room_id` buffering up to `capacity` events per lagging subscriber.
    pub fn new(room_id: impl Into<String>, capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            room_id: room_id.into(),
            sender,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Number of open streams on this room.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish `event` and return how many streams received it.
    pub fn publish(&self, event: ServerEvent) -> usize {
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(room_id = %self.room_id, delivered, "room event published");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_counts_open_streams() {
        let hub = RoomEventHub::new("ABC234", 4);
        assert_eq!(hub.publish(ServerEvent::new(None::<String>, "lost".into())), 0);

        let mut first = hub.subscribe();
        let _second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);
        assert_eq!(hub.publish(ServerEvent::new(Some("ping".into()), "1".into())), 2);

        let event = first.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("ping"));
        assert_eq!(event.data, "1");
    }
}
