//! Typed publish/subscribe for store writes and statistics snapshots.
//!
//! The bus fans every published [`Event`] out to all live subscribers over
//! unbounded `crossbeam-channel` queues. Publishing never blocks; a
//! subscriber that has dropped its receiver is pruned on the next publish.

use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::debug;

use crate::observation::Observation;
use crate::statistics::Statistics;

/// Everything the engine announces to interested services.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An observation was committed to the store.
    NewObservation(Observation),
    /// A statistics snapshot was generated and published.
    NewStatistics(Arc<Statistics>),
}

impl Event {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewObservation(_) => "new_observation",
            Self::NewStatistics(_) => "new_statistics",
        }
    }
}

/// Many-producer, many-consumer event fan-out.
#[derive(Debug, Default)]
pub struct EventBus {
    /// One sender per subscriber.
    subscribers: Mutex<Vec<Sender<Event>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber. It sees every event published after this call.
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = unbounded();
        self.lock().push(tx);
        rx
    }

    /// Sends `event` to every live subscriber and returns how many received it.
    pub fn publish(&self, event: Event) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        debug!(kind = event.kind(), subscribers = subscribers.len(), "published event");
        subscribers.len()
    }

    /// Number of registered subscribers, including ones not yet pruned.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<Event>>> {
        // A panic while holding this lock cannot leave the vector half-updated.
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
