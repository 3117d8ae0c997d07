//! Error types for the topic bus.
//!
//! Delivery failures are deliberately absent: a timed-out or closed queue is
//! a normal best-effort outcome, reported through
//! [`DeliveryReport`](crate::DeliveryReport) rather than as an error.

use thiserror::Error;

/// Errors surfaced synchronously by bus construction and subscription.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A subscribe request was structurally invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from reading a [`Subscription`](crate::Subscription).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Every sender for this queue is gone and the queue is drained.
    #[error("Subscription queue closed")]
    Closed,
}
