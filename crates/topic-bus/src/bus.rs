//! # Message Bus
//!
//! Public facade tying the registry to the delivery engine. A bus is a cheap
//! `Clone` handle; every clone shares the same registry and counters.

use crate::config::BusConfig;
use crate::delivery::{BusStats, DeliveryEngine, DeliveryObserver, DeliveryReport};
use crate::error::BusError;
use crate::id::{IdGenerator, SubscriptionId, UuidGenerator};
use crate::registry::{Endpoint, SubscriptionRegistry};
use crate::subscription::Subscription;
use crate::topic::{Topic, TopicMessage};
use crate::MAX_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Trait for publishing messages to the bus.
#[async_trait]
pub trait MessagePublisher<T>: Send + Sync {
    /// Deliver `message` to every queue subscribed to its topic.
    ///
    /// Returns after all deliveries resolve, at most about one delivery
    /// timeout later. Drops are silent.
    async fn publish(&self, message: TopicMessage<T>);
}

/// Trait for registering and removing subscriber queues.
pub trait MessageSubscriber<T>: Send + Sync {
    /// Register a caller-owned queue under `topic`.
    ///
    /// # Errors
    ///
    /// - `BusError::InvalidArgument` - empty topic or already-closed queue
    fn subscribe(&self, topic: Topic, queue: Endpoint<T>) -> Result<SubscriptionId, BusError>;

    /// Stop delivering to the queue registered as `id` under `topic`.
    fn unsubscribe(&self, topic: &str, id: SubscriptionId);
}

/// In-process topic bus for one payload type.
pub struct MessageBus<T> {
    registry: Arc<SubscriptionRegistry<T>>,
    engine: Arc<DeliveryEngine<T>>,
    default_capacity: usize,
}

impl<T> Clone for MessageBus<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            engine: Arc::clone(&self.engine),
            default_capacity: self.default_capacity,
        }
    }
}

impl<T> MessageBus<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a bus with default configuration.
    #[must_use]
    pub fn new() -> Self {
        let config = BusConfig::default();
        Self::from_parts(
            SubscriptionRegistry::new(),
            DeliveryEngine::new(config.delivery_timeout),
            config.default_capacity,
        )
    }

    /// Create a bus with the given configuration.
    ///
    /// # Errors
    ///
    /// - `BusError::InvalidConfig` - the configuration fails validation
    pub fn with_config(config: BusConfig) -> Result<Self, BusError> {
        Self::builder().config(config).build()
    }

    /// Start building a bus with a custom id source or drop observer.
    #[must_use]
    pub fn builder() -> MessageBusBuilder<T> {
        MessageBusBuilder::new()
    }

    fn from_parts(
        registry: SubscriptionRegistry<T>,
        engine: DeliveryEngine<T>,
        default_capacity: usize,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            engine: Arc::new(engine),
            default_capacity,
        }
    }

    /// Register a caller-owned queue under `topic`.
    ///
    /// The caller keeps the receiving half and is responsible for draining it.
    ///
    /// # Errors
    ///
    /// - `BusError::InvalidArgument` - empty topic or the receiver is already dropped
    pub fn subscribe(
        &self,
        topic: impl Into<Topic>,
        queue: Endpoint<T>,
    ) -> Result<SubscriptionId, BusError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(BusError::InvalidArgument("topic must not be empty".to_string()));
        }
        if queue.is_closed() {
            return Err(BusError::InvalidArgument(format!(
                "queue for topic '{topic}' is already closed"
            )));
        }

        Ok(self.registry.subscribe(topic, queue))
    }

    /// Create a bounded queue of `capacity` and register it under `topic`.
    ///
    /// # Errors
    ///
    /// - `BusError::InvalidArgument` - empty topic, zero capacity, or capacity
    ///   above [`MAX_CHANNEL_CAPACITY`]
    pub fn subscribe_channel(
        &self,
        topic: impl Into<Topic>,
        capacity: usize,
    ) -> Result<Subscription<T>, BusError> {
        if capacity == 0 {
            return Err(BusError::InvalidArgument(
                "queue capacity must be greater than zero".to_string(),
            ));
        }
        if capacity > MAX_CHANNEL_CAPACITY {
            return Err(BusError::InvalidArgument(format!(
                "queue capacity {capacity} exceeds maximum {MAX_CHANNEL_CAPACITY}"
            )));
        }

        let topic = topic.into();
        let (sender, receiver) = mpsc::channel(capacity);
        let id = self.subscribe(topic.clone(), sender)?;
        Ok(Subscription::new(id, topic, receiver))
    }

    /// Like [`subscribe_channel`](Self::subscribe_channel) with the configured
    /// default capacity.
    ///
    /// # Errors
    ///
    /// - `BusError::InvalidArgument` - empty topic
    pub fn subscribe_default(&self, topic: impl Into<Topic>) -> Result<Subscription<T>, BusError> {
        self.subscribe_channel(topic, self.default_capacity)
    }

    /// Stop delivering to the queue registered as `id` under `topic`.
    ///
    /// Unknown pairs are ignored. The queue itself is left untouched.
    pub fn unsubscribe(&self, topic: impl AsRef<str>, id: SubscriptionId) {
        self.registry.unsubscribe(topic.as_ref(), id);
    }

    /// Deliver `message` to every queue currently subscribed to its topic.
    pub async fn publish(&self, message: TopicMessage<T>) {
        self.publish_with_report(message).await;
    }

    /// Like [`publish`](Self::publish), returning the per-endpoint tally.
    pub async fn publish_with_report(&self, message: TopicMessage<T>) -> DeliveryReport {
        let snapshot = self.registry.snapshot(message.topic().as_str());
        self.engine.deliver(message, snapshot).await
    }

    /// Cumulative delivery counters.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        self.engine.stats()
    }

    /// Number of queues registered under `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: impl AsRef<str>) -> usize {
        self.registry.subscriber_count(topic.as_ref())
    }

    /// Number of topics with at least one queue.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.registry.topic_count()
    }

    /// Topics with at least one queue.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        self.registry.topics()
    }

    /// Per-delivery timeout.
    #[must_use]
    pub fn delivery_timeout(&self) -> Duration {
        self.engine.timeout()
    }

    /// Capacity used by [`subscribe_default`](Self::subscribe_default).
    #[must_use]
    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }
}

impl<T> Default for MessageBus<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> MessagePublisher<T> for MessageBus<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn publish(&self, message: TopicMessage<T>) {
        MessageBus::publish(self, message).await;
    }
}

impl<T> MessageSubscriber<T> for MessageBus<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe(&self, topic: Topic, queue: Endpoint<T>) -> Result<SubscriptionId, BusError> {
        MessageBus::subscribe(self, topic, queue)
    }

    fn unsubscribe(&self, topic: &str, id: SubscriptionId) {
        MessageBus::unsubscribe(self, topic, id);
    }
}

/// Builder for a [`MessageBus`] with non-default collaborators.
pub struct MessageBusBuilder<T> {
    config: BusConfig,
    id_generator: Box<dyn IdGenerator>,
    observer: Option<Arc<dyn DeliveryObserver<T>>>,
}

impl<T> MessageBusBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start from the default configuration and random UUID ids.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: BusConfig::default(),
            id_generator: Box::new(UuidGenerator),
            observer: None,
        }
    }

    /// Use `config` for timeouts and default capacity.
    #[must_use]
    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the per-delivery timeout.
    #[must_use]
    pub fn delivery_timeout(mut self, timeout: Duration) -> Self {
        self.config.delivery_timeout = timeout;
        self
    }

    /// Issue subscription ids from `generator`.
    #[must_use]
    pub fn id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Box::new(generator);
        self
    }

    /// Notify `observer` of every dropped delivery.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn DeliveryObserver<T>>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validate the configuration and create the bus.
    ///
    /// # Errors
    ///
    /// - `BusError::InvalidConfig` - the configuration fails validation
    pub fn build(self) -> Result<MessageBus<T>, BusError> {
        self.config.validate()?;

        let mut engine = DeliveryEngine::new(self.config.delivery_timeout);
        if let Some(observer) = self.observer {
            engine = engine.with_observer(observer);
        }

        Ok(MessageBus::from_parts(
            SubscriptionRegistry::with_id_generator(self.id_generator),
            engine,
            self.config.default_capacity,
        ))
    }
}

impl<T> Default for MessageBusBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
