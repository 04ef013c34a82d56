// crates/core/src/bus.rs
//! Progress event bus: per-subscriber bounded queues with best-effort
//! fan-out.
//!
//! Every live SSE connection owns one bounded queue. `publish` never blocks
//! and never fails the caller: it takes a point-in-time copy of the
//! subscriber set, then offers the event to each queue without waiting. A
//! subscriber whose queue is full is dropped on the spot
//! (backpressure-via-disconnect), so one stalled viewer can never slow a
//! worker or starve the other viewers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use clipdeck_types::ProgressEvent;

/// Events buffered per subscriber before it is considered dead.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 100;

struct BusInner {
    subscribers: Mutex<HashMap<u64, mpsc::Sender<ProgressEvent>>>,
    next_id: AtomicU64,
    capacity: usize,
}

/// Fan-out hub for progress events. Cheap to clone; all clones share the
/// same subscriber set.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

/// What a blocking receive produced.
#[derive(Debug)]
pub enum RecvOutcome {
    /// An event arrived.
    Event(ProgressEvent),
    /// Nothing arrived within the timeout; the transport should emit a
    /// keepalive and try again.
    Timeout,
    /// The bus evicted this subscriber (or was dropped); the stream is over.
    Closed,
}

/// One subscriber's end of the bus. Dropping it deregisters the queue and
/// discards anything still buffered.
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<ProgressEvent>,
    bus: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Create a bus whose subscriber queues hold `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Register a new subscriber and hand back its receiving end.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        match self.inner.subscribers.lock() {
            Ok(mut subscribers) => {
                subscribers.insert(id, tx);
            }
            Err(e) => tracing::error!("bus lock poisoned on subscribe: {e}"),
        }
        tracing::debug!(subscriber_id = id, "subscriber connected");
        Subscription {
            id,
            rx,
            bus: Arc::clone(&self.inner),
        }
    }

    /// Offer `event` to every current subscriber without blocking.
    ///
    /// The registration lock is held only to copy the sender set; the
    /// per-subscriber enqueue attempts run against that copy. Full or closed
    /// queues mark the subscriber dead and it is removed afterwards.
    pub fn publish(&self, event: &ProgressEvent) {
        let senders: Vec<(u64, mpsc::Sender<ProgressEvent>)> = match self.inner.subscribers.lock()
        {
            Ok(subscribers) => subscribers.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
            Err(e) => {
                tracing::error!("bus lock poisoned on publish: {e}");
                return;
            }
        };

        let mut dead = Vec::new();
        for (id, tx) in senders {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(subscriber_id = id, "subscriber queue full, dropping it");
                    dead.push(id);
                }
                Err(TrySendError::Closed(_)) => dead.push(id),
            }
        }

        if !dead.is_empty() {
            if let Ok(mut subscribers) = self.inner.subscribers.lock() {
                for id in dead {
                    subscribers.remove(&id);
                }
            }
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscription {
    /// Opaque id of this subscriber, surfaced in the SSE connected frame.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait up to `timeout` for the next event.
    pub async fn next(&mut self, timeout: Duration) -> RecvOutcome {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(event)) => RecvOutcome::Event(event),
            Ok(None) => RecvOutcome::Closed,
            Err(_) => RecvOutcome::Timeout,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Ok(mut subscribers) = self.bus.subscribers.lock() {
            subscribers.remove(&self.id);
        }
        tracing::debug!(subscriber_id = self.id, "subscriber disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipdeck_types::JobStatus;

    fn event(id: &str, percent: f64) -> ProgressEvent {
        let mut event = ProgressEvent::status_change(id, JobStatus::Downloading, None);
        event.progress.percent = Some(percent);
        event
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers_in_order() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(&event("x", 42.0));
        bus.publish(&event("x", 43.0));

        for sub in [&mut first, &mut second] {
            let RecvOutcome::Event(e1) = sub.next(Duration::from_secs(1)).await else {
                panic!("expected first event");
            };
            let RecvOutcome::Event(e2) = sub.next(Duration::from_secs(1)).await else {
                panic!("expected second event");
            };
            assert_eq!(e1.download_id, "x");
            assert_eq!(e1.progress.percent, Some(42.0));
            assert_eq!(e2.progress.percent, Some(43.0));
        }
    }

    #[tokio::test]
    async fn test_publish_with_no_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish(&event("x", 1.0));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_is_dropped_without_blocking_others() {
        let bus = EventBus::with_capacity(2);
        let slow = bus.subscribe();
        let mut live = bus.subscribe();

        // Fill the slow queue past capacity; the third publish evicts it.
        bus.publish(&event("x", 1.0));
        bus.publish(&event("x", 2.0));
        bus.publish(&event("x", 3.0));
        assert_eq!(bus.subscriber_count(), 1);

        // The live subscriber still has all three events.
        for expected in [1.0, 2.0, 3.0] {
            let RecvOutcome::Event(e) = live.next(Duration::from_secs(1)).await else {
                panic!("expected event {expected}");
            };
            assert_eq!(e.progress.percent, Some(expected));
        }
        drop(slow);
    }

    #[tokio::test]
    async fn test_evicted_subscriber_sees_closed_after_draining() {
        let bus = EventBus::with_capacity(1);
        let mut slow = bus.subscribe();
        bus.publish(&event("x", 1.0));
        bus.publish(&event("x", 2.0)); // queue full -> evicted

        // The buffered event is still delivered, then the channel closes.
        assert!(matches!(
            slow.next(Duration::from_secs(1)).await,
            RecvOutcome::Event(_)
        ));
        assert!(matches!(
            slow.next(Duration::from_secs(1)).await,
            RecvOutcome::Closed
        ));
    }

    #[tokio::test]
    async fn test_timeout_signals_keepalive() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        assert!(matches!(
            sub.next(Duration::from_millis(10)).await,
            RecvOutcome::Timeout
        ));
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
