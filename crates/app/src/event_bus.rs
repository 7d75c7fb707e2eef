//! In-process event bus backed by a tokio broadcast channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use hearth_domain::error::HearthError;
use hearth_domain::event::Event;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). Each subscriber has a bounded queue of
/// `capacity` events; a subscriber that falls behind loses the oldest
/// events, which is counted on the shared dropped-event counter.
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
    dropped: Arc<AtomicU64>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given per-subscriber queue capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe with a raw broadcast receiver.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Subscribe with an [`EventStream`] that absorbs overflow.
    ///
    /// Lagged receives are converted into dropped-event accounting
    /// instead of surfacing as errors.
    #[must_use]
    pub fn stream(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Total events dropped across all [`EventStream`] subscribers.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HearthError>> + Send {
        // broadcast::send fails only when there are zero receivers,
        // which is fine — we simply ignore the error.
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

use std::future::Future;

/// A subscription that keeps running through queue overflow.
pub struct EventStream {
    receiver: broadcast::Receiver<Event>,
    dropped: Arc<AtomicU64>,
}

impl EventStream {
    /// Receive the next event.
    ///
    /// When the subscriber has lagged, the skipped count is added to the
    /// bus-wide dropped-event counter and the next available event is
    /// returned. Returns `None` once the bus is closed and drained.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.dropped.fetch_add(skipped, Ordering::Relaxed);
                    tracing::warn!(skipped, "event bus subscriber fell behind, oldest events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive without waiting; `None` when the queue is currently empty
    /// or the bus is closed.
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    self.dropped.fetch_add(skipped, Ordering::Relaxed);
                    tracing::warn!(skipped, "event bus subscriber fell behind, oldest events dropped");
                }
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}
