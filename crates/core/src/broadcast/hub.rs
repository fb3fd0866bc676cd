//! Fan-out of pipeline events to live subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::PipelineEvent;
use crate::metrics::SUBSCRIBERS_DROPPED;
use crate::ticket::{TicketError, TicketStore};

/// Identifies a subscription for [`BroadcastHub::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Receiving end of a subscription.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<PipelineEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event, or `None` once the hub has dropped this subscriber.
    pub async fn recv(&mut self) -> Option<PipelineEvent> {
        self.rx.recv().await
    }

    /// Non-blocking receive, mostly for tests.
    pub fn try_recv(&mut self) -> Option<PipelineEvent> {
        self.rx.try_recv().ok()
    }
}

/// Publishes events to an open set of subscribers.
///
/// Each subscriber has its own bounded queue. Publishing never waits: a
/// subscriber whose queue is full or closed is removed and the rest still
/// receive the event.
pub struct BroadcastHub {
    store: Arc<dyn TicketStore>,
    buffer: usize,
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<PipelineEvent>>>,
    next_id: AtomicU64,
}

impl BroadcastHub {
    pub fn new(store: Arc<dyn TicketStore>, buffer: usize) -> Self {
        Self {
            store,
            buffer: buffer.max(1),
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscriber. The first event it receives is a snapshot of
    /// every ticket, taken under the same lock publishers use, so nothing
    /// published afterwards can be missed or arrive ahead of it.
    pub fn subscribe(&self) -> Result<Subscription, TicketError> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut subscribers = self.lock();
        let tickets = self.store.list()?;
        tx.try_send(PipelineEvent::InitialState { tickets })
            .map_err(|e| TicketError::Storage(format!("failed to queue snapshot: {}", e)))?;
        subscribers.insert(id, tx);
        debug!(subscriber = id.0, total = subscribers.len(), "Subscriber registered");

        Ok(Subscription { id, rx })
    }

    /// Remove a subscriber. Unknown or already-removed ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.lock().remove(&id).is_some() {
            debug!(subscriber = id.0, "Subscriber removed");
        }
    }

    /// Deliver an event to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: PipelineEvent) -> usize {
        let mut subscribers = self.lock();
        let mut delivered = 0;

        subscribers.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(subscriber = id.0, "Subscriber queue full, disconnecting");
                SUBSCRIBERS_DROPPED.with_label_values(&["full"]).inc();
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscriber = id.0, "Subscriber gone");
                SUBSCRIBERS_DROPPED.with_label_values(&["closed"]).inc();
                false
            }
        });

        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<PipelineEvent>>> {
        // A panic while holding this lock cannot leave the map inconsistent.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{InMemoryTicketStore, Ticket, TicketState};

    fn hub_with(ids: &[&str], buffer: usize) -> (Arc<InMemoryTicketStore>, BroadcastHub) {
        let store = Arc::new(InMemoryTicketStore::new());
        for id in ids {
            store.put(TicketState::new(Ticket::new(*id, "IAM", "x"))).unwrap();
        }
        let hub = BroadcastHub::new(store.clone(), buffer);
        (store, hub)
    }

    fn start(msg: &str) -> PipelineEvent {
        PipelineEvent::ProcessingStart {
            message: msg.to_string(),
            ticket_id: None,
        }
    }

    #[tokio::test]
    async fn test_first_event_is_snapshot() {
        let (_store, hub) = hub_with(&["A", "B"], 8);
        let mut sub = hub.subscribe().unwrap();

        match sub.recv().await.unwrap() {
            PipelineEvent::InitialState { tickets } => {
                let ids: Vec<_> = tickets.iter().map(|t| t.ticket.id.as_str()).collect();
                assert_eq!(ids, vec!["A", "B"]);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_events_arrive_in_publish_order() {
        let (_store, hub) = hub_with(&[], 8);
        let mut sub = hub.subscribe().unwrap();
        sub.recv().await.unwrap();

        hub.publish(start("one"));
        hub.publish(start("two"));

        assert_eq!(sub.recv().await.unwrap(), start("one"));
        assert_eq!(sub.recv().await.unwrap(), start("two"));
    }

    #[test]
    fn test_full_subscriber_is_dropped_others_still_receive() {
        let (_store, hub) = hub_with(&[], 2);
        let mut slow = hub.subscribe().unwrap();
        let mut fast = hub.subscribe().unwrap();
        fast.try_recv().unwrap();

        // slow still holds its snapshot, so one more fills it and the next overflows
        assert_eq!(hub.publish(start("1")), 2);
        fast.try_recv().unwrap();
        assert_eq!(hub.publish(start("2")), 1);
        assert_eq!(hub.subscriber_count(), 1);

        assert_eq!(fast.try_recv().unwrap(), start("2"));
        assert!(matches!(
            slow.try_recv().unwrap(),
            PipelineEvent::InitialState { .. }
        ));
        assert_eq!(slow.try_recv().unwrap(), start("1"));
        assert!(slow.try_recv().is_none());
    }

    #[test]
    fn test_closed_subscriber_is_dropped() {
        let (_store, hub) = hub_with(&[], 4);
        let gone = hub.subscribe().unwrap();
        let _alive = hub.subscribe().unwrap();
        drop(gone);

        assert_eq!(hub.publish(start("x")), 1);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let (_store, hub) = hub_with(&[], 4);
        let sub = hub.subscribe().unwrap();

        hub.unsubscribe(sub.id());
        hub.unsubscribe(sub.id());
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish(start("x")), 0);
    }

    #[test]
    fn test_snapshot_reflects_latest_store_contents() {
        let (store, hub) = hub_with(&["A"], 4);
        store.put(TicketState::new(Ticket::new("B", "IAM", "y"))).unwrap();

        let mut sub = hub.subscribe().unwrap();
        match sub.try_recv().unwrap() {
            PipelineEvent::InitialState { tickets } => assert_eq!(tickets.len(), 2),
            other => panic!("expected snapshot, got {:?}", other),
        }
    }
}
