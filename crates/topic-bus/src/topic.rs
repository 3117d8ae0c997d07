//! # Topics and Messages
//!
//! A topic is an opaque name compared by exact string equality. There is no
//! hierarchy and no wildcard matching.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Name of a message channel.
///
/// Cloning is cheap: the name is shared behind an `Arc`, so every delivered
/// message can carry its topic without reallocating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Topic(Arc<str>);

impl Topic {
    /// Create a topic from any string-like value.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The topic name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the topic name is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0.to_string()
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// An immutable `(topic, payload)` pair.
///
/// The payload type is fixed per bus instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage<T> {
    topic: Topic,
    payload: T,
}

impl<T> TopicMessage<T> {
    /// Tag a payload with a topic.
    pub fn new(topic: impl Into<Topic>, payload: T) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// The topic this message is routed by.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Borrow the payload.
    #[must_use]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Consume the message, returning the payload.
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Consume the message, returning both halves.
    pub fn into_parts(self) -> (Topic, T) {
        (self.topic, self.payload)
    }
}
