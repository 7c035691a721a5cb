//! # Event Bus
//!
//! One broadcast channel carries every [`ConsensusEvent`]; subscribers filter
//! on their side. The bus counts what it emitted per topic and how many live
//! subscriptions listen to each topic.

use crate::events::{ConsensusEvent, EventFilter, EventTopic};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Per-topic listener counts shared between the bus and its subscriptions.
#[derive(Debug, Default)]
pub(crate) struct Listeners {
    by_topic: BTreeMap<EventTopic, usize>,
}

impl Listeners {
    fn topics_of(filter: &EventFilter) -> Vec<EventTopic> {
        if filter.topics.is_empty() {
            vec![EventTopic::All]
        } else {
            filter.topics.clone()
        }
    }

    pub(crate) fn join(&mut self, filter: &EventFilter) {
        for topic in Self::topics_of(filter) {
            *self.by_topic.entry(topic).or_insert(0) += 1;
        }
    }

    pub(crate) fn leave(&mut self, filter: &EventFilter) {
        for topic in Self::topics_of(filter) {
            if let Some(count) = self.by_topic.get_mut(&topic) {
                *count -= 1;
                if *count == 0 {
                    self.by_topic.remove(&topic);
                }
            }
        }
    }

    /// Subscriptions that would receive an event of `topic`.
    fn listening_to(&self, topic: EventTopic) -> usize {
        let direct = self.by_topic.get(&topic).copied().unwrap_or(0);
        if topic == EventTopic::All {
            return direct;
        }
        direct + self.by_topic.get(&EventTopic::All).copied().unwrap_or(0)
    }
}

/// Snapshot of bus activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusStats {
    pub emitted: BTreeMap<EventTopic, u64>,
    /// Events emitted while nobody was subscribed.
    pub unheard: u64,
}

/// In-process bus for consensus events.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<ConsensusEvent>,
    listeners: Arc<Mutex<Listeners>>,
    stats: Mutex<BusStats>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` is how far a subscriber may fall behind before it lags.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            listeners: Arc::new(Mutex::new(Listeners::default())),
            stats: Mutex::new(BusStats::default()),
            capacity,
        }
    }

    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.listeners.lock().join(&filter);
        trace!(topics = ?filter.topics, "Subscribed");
        Subscription::new(self.sender.subscribe(), filter, Arc::clone(&self.listeners))
    }

    /// Broadcast `event`. Returns how many subscriptions will see it.
    ///
    /// Never blocks, so synchronous component code can call it directly.
    pub fn emit(&self, event: ConsensusEvent) -> usize {
        let topic = event.topic();
        let interested = self.listeners.lock().listening_to(topic);

        let delivered = self.sender.send(event).is_ok();
        let mut stats = self.stats.lock();
        *stats.emitted.entry(topic).or_insert(0) += 1;
        if !delivered {
            stats.unheard += 1;
            trace!(?topic, "Event emitted with no subscribers");
            return 0;
        }
        trace!(?topic, interested, "Event emitted");
        interested
    }

    /// Live subscriptions regardless of filter.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn stats(&self) -> BusStats {
        self.stats.lock().clone()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}
