//! # Subscription Registry
//!
//! Thread-safe `topic -> id -> endpoint` map. A single lock guards the whole
//! structure; it is held only for the map operation itself, never across
//! delivery.

use crate::id::{IdGenerator, SubscriptionId, UuidGenerator};
use crate::topic::{Topic, TopicMessage};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

/// Sending half of a subscriber-owned bounded queue.
///
/// The bus only ever enqueues; it never closes or drains the queue.
pub type Endpoint<T> = mpsc::Sender<TopicMessage<T>>;

type TopicMap<T> = HashMap<Topic, HashMap<SubscriptionId, Endpoint<T>>>;

/// Registry of live endpoints, keyed by topic.
pub struct SubscriptionRegistry<T> {
    topics: RwLock<TopicMap<T>>,
    id_generator: Box<dyn IdGenerator>,
}

impl<T> SubscriptionRegistry<T> {
    /// Create an empty registry issuing random UUID ids.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(UuidGenerator))
    }

    /// Create an empty registry with a custom id source.
    #[must_use]
    pub fn with_id_generator(id_generator: Box<dyn IdGenerator>) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            id_generator,
        }
    }

    /// Register `endpoint` under `topic` and return its fresh id.
    pub fn subscribe(&self, topic: Topic, endpoint: Endpoint<T>) -> SubscriptionId {
        let id = self.id_generator.next_id();

        {
            let mut topics = self.topics.write();
            topics.entry(topic.clone()).or_default().insert(id, endpoint);
        }

        debug!(topic = %topic, subscription_id = %id, "Subscription registered");
        id
    }

    /// Remove the endpoint registered as `id` under `topic`.
    ///
    /// Unknown topics and ids are ignored. Returns whether anything was removed.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> bool {
        let removed = {
            let mut topics = self.topics.write();
            let Some(endpoints) = topics.get_mut(topic) else {
                return false;
            };
            let removed = endpoints.remove(&id).is_some();
            if endpoints.is_empty() {
                topics.remove(topic);
            }
            removed
        };

        if removed {
            debug!(topic = %topic, subscription_id = %id, "Subscription removed");
        }
        removed
    }

    /// Copy of the endpoints currently registered under `topic`.
    ///
    /// Later mutations do not affect a snapshot already taken.
    #[must_use]
    pub fn snapshot(&self, topic: &str) -> Vec<(SubscriptionId, Endpoint<T>)> {
        let topics = self.topics.read();
        topics
            .get(topic)
            .map(|endpoints| {
                endpoints
                    .iter()
                    .map(|(id, endpoint)| (*id, endpoint.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of endpoints registered under `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, HashMap::len)
    }

    /// Number of topics with at least one endpoint.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }

    /// Topics with at least one endpoint, in no particular order.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        self.topics.read().keys().cloned().collect()
    }

    /// Whether `id` is currently registered under `topic`.
    #[must_use]
    pub fn is_subscribed(&self, topic: &str, id: SubscriptionId) -> bool {
        self.topics
            .read()
            .get(topic)
            .is_some_and(|endpoints| endpoints.contains_key(&id))
    }
}

impl<T> Default for SubscriptionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
