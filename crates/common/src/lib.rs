//! Shared types for the resilience and saga crates.

pub mod types;

pub use types::{Amount, OrderId, UserId};
