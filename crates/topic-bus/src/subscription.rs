//! # Subscription Handle
//!
//! Consumer side of a bus-created queue. Dropping the handle closes the queue
//! but does not unregister it; call
//! [`MessageBus::unsubscribe`](crate::MessageBus::unsubscribe) for that.

use crate::error::SubscriptionError;
use crate::id::SubscriptionId;
use crate::topic::{Topic, TopicMessage};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_stream::wrappers::ReceiverStream;

/// A registered queue together with the id and topic needed to unsubscribe it.
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriptionId,
    topic: Topic,
    receiver: mpsc::Receiver<TopicMessage<T>>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        id: SubscriptionId,
        topic: Topic,
        receiver: mpsc::Receiver<TopicMessage<T>>,
    ) -> Self {
        Self {
            id,
            topic,
            receiver,
        }
    }

    /// Id issued at subscribe time.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Topic this queue is registered under.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Receive the next message.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next queued message
    /// - `None` - The queue is closed and drained
    pub async fn recv(&mut self) -> Option<TopicMessage<T>> {
        self.receiver.recv().await
    }

    /// Receive the next message without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - A message was queued
    /// - `Ok(None)` - The queue is currently empty
    /// - `Err(SubscriptionError::Closed)` - No sender remains and the queue is drained
    pub fn try_recv(&mut self) -> Result<Option<TopicMessage<T>>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Number of messages waiting in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Convert into a `Stream` for use with stream combinators.
    ///
    /// The id is lost; keep it beforehand if you intend to unsubscribe.
    pub fn into_stream(self) -> ReceiverStream<TopicMessage<T>> {
        ReceiverStream::new(self.receiver)
    }

    /// Split into id, topic, and raw receiver.
    pub fn into_parts(self) -> (SubscriptionId, Topic, mpsc::Receiver<TopicMessage<T>>) {
        (self.id, self.topic, self.receiver)
    }
}
