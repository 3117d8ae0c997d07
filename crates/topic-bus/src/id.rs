//! # Subscription Identifiers
//!
//! Ids only disambiguate endpoints registered under the same topic. They come
//! from an [`IdGenerator`], whose sole contract is that it never returns the
//! same value twice during its lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Opaque token identifying one registration under one topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Source of fresh subscription ids, called once per subscribe.
pub trait IdGenerator: Send + Sync {
    /// Return an id distinct from every id previously returned.
    fn next_id(&self) -> SubscriptionId;
}

/// Random (v4) UUID ids. The default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(Uuid::new_v4())
    }
}

/// Monotonic counter ids.
///
/// Produces `00000000-0000-0000-0000-000000000001`, `...02`, and so on, which
/// keeps logs and test assertions reproducible.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Create a generator whose first id is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> SubscriptionId {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        SubscriptionId(Uuid::from_u128(u128::from(n)))
    }
}
