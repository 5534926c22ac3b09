//! The two services taking part in the saga.

pub mod order;
pub mod wallet;

pub use order::OrderTracker;
pub use wallet::{Account, CreditLedger};
