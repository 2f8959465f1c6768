//! Cluster operations over an eventually-consistent control plane
//!
//! Namespace creation and deletion are issued through the control-plane
//! client and confirmed by polling, since a change is not visible in
//! listings immediately.

mod client;
mod counters;
mod lifecycle;
mod poll;

pub use client::ClusterCli;
pub use counters::Counters;
pub use lifecycle::E2eTest;
pub use poll::{poll_until, retry, PollOutcome, Presence, RetryPolicy};
