//! # Delivery Engine
//!
//! Fans one message out to a registry snapshot. Every endpoint gets its own
//! attempt, bounded by a deadline shared by the whole publish, so the caller
//! waits roughly one timeout period no matter how many subscribers stall.
//!
//! ## Outcomes
//!
//! | Queue state                      | Outcome     |
//! |----------------------------------|-------------|
//! | slot free (now or before deadline) | `Delivered` |
//! | still full at the deadline       | `TimedOut`  |
//! | receiver dropped                 | `Closed`    |
//!
//! Dropped deliveries are never retried and never surface as errors.

use crate::id::SubscriptionId;
use crate::registry::Endpoint;
use crate::topic::{Topic, TopicMessage};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::{self, JoinSet};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

/// Result of one delivery attempt to one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryOutcome {
    /// The message was enqueued.
    Delivered,
    /// The queue stayed full until the deadline.
    TimedOut,
    /// The subscriber dropped its receiver.
    Closed,
}

impl DeliveryOutcome {
    /// Whether the message was lost for this endpoint.
    #[must_use]
    pub fn is_dropped(self) -> bool {
        !matches!(self, Self::Delivered)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Delivered => "delivered",
            Self::TimedOut => "timed_out",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Per-publish tally of delivery outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Topic the message was published to.
    pub topic: Topic,
    /// Endpoints in the snapshot.
    pub attempted: usize,
    /// Endpoints that received the message.
    pub delivered: usize,
    /// Endpoints whose queue stayed full past the deadline.
    pub timed_out: usize,
    /// Endpoints whose receiver was gone.
    pub closed: usize,
}

impl DeliveryReport {
    fn new(topic: Topic, attempted: usize) -> Self {
        Self {
            topic,
            attempted,
            delivered: 0,
            timed_out: 0,
            closed: 0,
        }
    }

    fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::TimedOut => self.timed_out += 1,
            DeliveryOutcome::Closed => self.closed += 1,
        }
    }

    /// Endpoints that did not receive the message.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.timed_out + self.closed
    }

    /// Whether every attempted endpoint received the message.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.delivered == self.attempted
    }
}

/// Cumulative counters since the bus was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Publish calls, including those with no subscribers.
    pub published: u64,
    /// Successful per-endpoint deliveries.
    pub delivered: u64,
    /// Deliveries abandoned at the deadline.
    pub timed_out: u64,
    /// Deliveries to a dropped receiver.
    pub closed: u64,
}

impl BusStats {
    /// Total deliveries lost for any reason.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.timed_out + self.closed
    }
}

/// Optional hook notified of every dropped delivery.
///
/// Called on the publishing task after the fan-out completes, so
/// implementations should be quick and must not publish back into the same
/// bus from a blocking context.
pub trait DeliveryObserver<T>: Send + Sync {
    /// `message` was not delivered to the endpoint registered as `id`.
    fn on_dropped(&self, id: SubscriptionId, outcome: DeliveryOutcome, message: &TopicMessage<T>);
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    delivered: AtomicU64,
    timed_out: AtomicU64,
    closed: AtomicU64,
}

impl Counters {
    fn record(&self, report: &DeliveryReport) {
        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.timed_out
            .fetch_add(report.timed_out as u64, Ordering::Relaxed);
        self.closed.fetch_add(report.closed as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> BusStats {
        BusStats {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            closed: self.closed.load(Ordering::Relaxed),
        }
    }
}

/// Timeout-bounded concurrent fan-out.
pub struct DeliveryEngine<T> {
    timeout: Duration,
    counters: Counters,
    observer: Option<Arc<dyn DeliveryObserver<T>>>,
}

impl<T> DeliveryEngine<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an engine with the given per-delivery timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            counters: Counters::default(),
            observer: None,
        }
    }

    /// Attach a hook for dropped deliveries.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DeliveryObserver<T>>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The per-delivery timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cumulative counters.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        self.counters.snapshot()
    }

    /// Deliver `message` to every endpoint in `snapshot`.
    ///
    /// Endpoints with a free slot are filled immediately. The rest each get a
    /// task racing the shared deadline; this returns once all of them have
    /// resolved.
    pub async fn deliver(
        &self,
        message: TopicMessage<T>,
        snapshot: Vec<(SubscriptionId, Endpoint<T>)>,
    ) -> DeliveryReport {
        self.counters.published.fetch_add(1, Ordering::Relaxed);

        let mut report = DeliveryReport::new(message.topic().clone(), snapshot.len());
        if snapshot.is_empty() {
            trace!(topic = %message.topic(), "No subscribers, message discarded");
            return report;
        }

        let deadline = deadline_after(self.timeout);
        let mut dropped = Vec::new();
        let mut pending = JoinSet::new();
        let mut tasks: HashMap<task::Id, SubscriptionId> = HashMap::new();

        for (id, endpoint) in snapshot {
            match endpoint.try_send(message.clone()) {
                Ok(()) => {
                    trace!(topic = %message.topic(), subscription_id = %id, "Delivered");
                    report.record(DeliveryOutcome::Delivered);
                }
                Err(TrySendError::Closed(_)) => {
                    report.record(DeliveryOutcome::Closed);
                    dropped.push((id, DeliveryOutcome::Closed));
                }
                Err(TrySendError::Full(msg)) => {
                    let handle = pending.spawn(async move {
                        match timeout_at(deadline, endpoint.send(msg)).await {
                            Ok(Ok(())) => DeliveryOutcome::Delivered,
                            Ok(Err(_)) => DeliveryOutcome::Closed,
                            Err(_) => DeliveryOutcome::TimedOut,
                        }
                    });
                    tasks.insert(handle.id(), id);
                }
            }
        }

        while let Some(joined) = pending.join_next_with_id().await {
            let (task_id, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    // Only reachable if the runtime is shutting down.
                    warn!(topic = %message.topic(), error = %e, "Delivery task aborted");
                    (e.id(), DeliveryOutcome::TimedOut)
                }
            };
            let Some(id) = tasks.remove(&task_id) else {
                continue;
            };

            report.record(outcome);
            if outcome.is_dropped() {
                dropped.push((id, outcome));
            } else {
                trace!(topic = %message.topic(), subscription_id = %id, "Delivered");
            }
        }

        for (id, outcome) in &dropped {
            debug!(
                topic = %message.topic(),
                subscription_id = %id,
                reason = %outcome,
                "Delivery dropped"
            );
            if let Some(observer) = &self.observer {
                observer.on_dropped(*id, *outcome, &message);
            }
        }

        self.counters.record(&report);
        debug!(
            topic = %report.topic,
            attempted = report.attempted,
            delivered = report.delivered,
            dropped = report.dropped(),
            "Message published"
        );
        report
    }
}

/// `now + timeout`, saturating to a far-future instant instead of overflowing.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Roughly 30 years, the same horizon tokio uses for "never".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);
