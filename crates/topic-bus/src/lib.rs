//! # Topic Bus - In-Process Publish/Subscribe
//!
//! Producers publish typed messages tagged with a topic; consumers register a
//! bounded queue under a topic and drain it at their own pace.
//!
//! ## Architecture
//!
//! ```text
//!  publish(msg)                         subscribe(topic, queue)
//!       │                                        │
//!       ▼                                        ▼
//! ┌──────────────────┐   snapshot(topic)  ┌──────────────────────┐
//! │ Delivery Engine  │ ◄───────────────── │ Subscription Registry│
//! └──────────────────┘                    └──────────────────────┘
//!       │  one task per endpoint, shared deadline
//!       ├──────────────┬──────────────┐
//!       ▼              ▼              ▼
//!   [queue A]      [queue B]      [queue C]   (subscriber-owned)
//! ```
//!
//! ## Delivery Semantics
//!
//! - **Best effort:** a full queue that does not free a slot before the
//!   delivery deadline loses that message; nothing is retried.
//! - **Independent failure domains:** a stalled subscriber never delays or
//!   fails delivery to any other subscriber.
//! - **Bounded publish:** `publish` returns after roughly one delivery timeout
//!   at most, regardless of subscriber count.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod config;
pub mod delivery;
pub mod error;
pub mod id;
pub mod registry;
pub mod subscription;
pub mod topic;

// Re-export main types
pub use bus::{MessageBus, MessageBusBuilder, MessagePublisher, MessageSubscriber};
pub use config::BusConfig;
pub use delivery::{
    BusStats, DeliveryEngine, DeliveryObserver, DeliveryOutcome, DeliveryReport,
};
pub use error::{BusError, SubscriptionError};
pub use id::{IdGenerator, SequentialIdGenerator, SubscriptionId, UuidGenerator};
pub use registry::{Endpoint, SubscriptionRegistry};
pub use subscription::Subscription;
pub use topic::{Topic, TopicMessage};

use std::time::Duration;

/// How long a single delivery may wait for a free queue slot.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Queue capacity used by [`MessageBus::subscribe_default`].
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Longest accepted delivery timeout.
pub const MAX_DELIVERY_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Largest queue capacity `tokio::sync::mpsc` can allocate.
pub const MAX_CHANNEL_CAPACITY: usize = tokio::sync::Semaphore::MAX_PERMITS;
