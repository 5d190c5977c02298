//! Realtime event hub.
//!
//! Fire-and-forget fan-out of stock events to every connected client.
//! There is no acknowledgement, no retry, and no persistence of missed
//! events: the hub is an optimization layer over the authoritative pull
//! sync path, and business logic must never depend on delivery.

use std::sync::atomic::{AtomicUsize, Ordering};

use jiff::Timestamp;
use tokio::sync::broadcast;

use crate::events::models::StockEvent;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct EventHub {
    sender: broadcast::Sender<StockEvent>,
    connected: AtomicUsize,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            sender,
            connected: AtomicUsize::new(0),
        }
    }

    /// Subscribe to the event stream. Slow subscribers that fall more than
    /// the channel capacity behind observe a lag error and skip ahead.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StockEvent> {
        self.sender.subscribe()
    }

    /// Stamp the event with the server clock and push it to every current
    /// subscriber. Returns `false`, never an error, when no subscriber is
    /// connected.
    pub fn broadcast(&self, mut event: StockEvent) -> bool {
        event.timestamp = Timestamp::now();

        self.sender.send(event).is_ok()
    }

    /// Record a client session joining the realtime channel.
    pub fn client_connected(&self) -> usize {
        self.connected.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a client session leaving the realtime channel.
    pub fn client_disconnected(&self) -> usize {
        self.connected.fetch_sub(1, Ordering::Relaxed).saturating_sub(1)
    }

    /// Number of currently connected client sessions.
    #[must_use]
    pub fn connected(&self) -> usize {
        self.connected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::events::models::EventKind;

    use super::*;

    #[tokio::test]
    async fn test_broadcast_without_subscribers_reports_false() {
        let hub = EventHub::new();

        let delivered = hub.broadcast(StockEvent::reduced(
            Uuid::new_v4(),
            "M".to_string(),
            "Red".to_string(),
            2,
        ));

        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscriber() {
        let hub = EventHub::new();
        let mut receiver = hub.subscribe();
        let product = Uuid::new_v4();

        let delivered = hub.broadcast(StockEvent::reduced(
            product,
            "M".to_string(),
            "Red".to_string(),
            2,
        ));

        assert!(delivered);

        let event = receiver.recv().await.unwrap();

        assert_eq!(event.event, EventKind::StockReduced);
        assert_eq!(event.product_id, product);
        assert_eq!(event.stock, Some(2));
    }

    #[tokio::test]
    async fn test_broadcast_fans_out_to_all_subscribers() {
        let hub = EventHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.broadcast(StockEvent::updated(
            Uuid::new_v4(),
            "S".to_string(),
            "Blue".to_string(),
            9,
        ));

        assert_eq!(first.recv().await.unwrap().stock, Some(9));
        assert_eq!(second.recv().await.unwrap().stock, Some(9));
    }

    #[tokio::test]
    async fn test_connection_counter_tracks_sessions() {
        let hub = EventHub::new();

        assert_eq!(hub.connected(), 0);
        assert_eq!(hub.client_connected(), 1);
        assert_eq!(hub.client_connected(), 2);
        assert_eq!(hub.client_disconnected(), 1);
        assert_eq!(hub.connected(), 1);
    }

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(EventKind::StockUpdated.as_str(), "stock:updated");
        assert_eq!(EventKind::StockReduced.as_str(), "stock:reduced");
        assert_eq!(EventKind::StockValidated.as_str(), "stock:validated");
        assert_eq!(EventKind::ProductUpdated.as_str(), "product:updated");
        assert_eq!(EventKind::ProductDeleted.as_str(), "product:deleted");
    }
}
