//! # Integration Tests
//!
//! End-to-end behaviour of the bus through its public API only.

pub mod concurrency;
pub mod pubsub_flows;
