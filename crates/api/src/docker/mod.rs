//! Docker daemon access for live container state.
//!
//! The GraphQL layer only sees the [`ops::ContainerOps`] trait.
//! `client.rs` holds the Bollard-backed implementation, `fake.rs` a test double.

pub mod client;
pub mod ops;

#[cfg(test)]
pub mod fake;
