//! Bus configuration from code, serde, or environment variables.

use crate::error::BusError;
use crate::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_DELIVERY_TIMEOUT, MAX_CHANNEL_CAPACITY, MAX_DELIVERY_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Tunables for a [`MessageBus`](crate::MessageBus).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Per-endpoint delivery deadline, serialized as milliseconds.
    #[serde(rename = "delivery_timeout_ms", with = "duration_ms")]
    pub delivery_timeout: Duration,

    /// Queue capacity for [`MessageBus::subscribe_default`](crate::MessageBus::subscribe_default).
    pub default_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            default_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl BusConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TOPIC_BUS_DELIVERY_TIMEOUT_MS`: Delivery timeout (default: 5000)
    /// - `TOPIC_BUS_DEFAULT_CAPACITY`: Default queue capacity (default: 1000)
    ///
    /// Missing or unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            delivery_timeout: env::var("TOPIC_BUS_DELIVERY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.delivery_timeout),

            default_capacity: env::var("TOPIC_BUS_DEFAULT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_capacity),
        }
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// - `BusError::InvalidConfig` - timeout or capacity outside its accepted range
    pub fn validate(&self) -> Result<(), BusError> {
        if self.delivery_timeout.is_zero() {
            return Err(BusError::InvalidConfig(
                "delivery_timeout must be greater than zero".to_string(),
            ));
        }

        if self.delivery_timeout > MAX_DELIVERY_TIMEOUT {
            return Err(BusError::InvalidConfig(format!(
                "delivery_timeout {:?} exceeds maximum {:?}",
                self.delivery_timeout, MAX_DELIVERY_TIMEOUT
            )));
        }

        // tokio::sync::mpsc::channel panics on zero or oversized capacity
        if self.default_capacity == 0 {
            return Err(BusError::InvalidConfig(
                "default_capacity must be greater than zero".to_string(),
            ));
        }

        if self.default_capacity > MAX_CHANNEL_CAPACITY {
            return Err(BusError::InvalidConfig(format!(
                "default_capacity {} exceeds maximum {MAX_CHANNEL_CAPACITY}",
                self.default_capacity
            )));
        }

        Ok(())
    }

    /// Builder-style method to set the delivery timeout
    #[must_use]
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Builder-style method to set the default queue capacity
    #[must_use]
    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
