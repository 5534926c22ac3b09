//! Event-driven credit reservation saga.
//!
//! Two autonomous services reach eventual consistency over an order's
//! financial reservation by exchanging events:
//! 1. The [`OrderTracker`] records a Pending order and publishes it
//! 2. The [`CreditLedger`] reserves the price from the user's balance, or declines
//! 3. The tracker settles the order as Accepted or Rejected and publishes it again
//! 4. The ledger commits the reservation, or compensates it back to the balance
//!
//! Each service runs one event loop consuming its inbound stream in order.

pub mod channel;
pub mod coordinator;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod order;
pub mod services;
pub mod state;

pub use channel::{EventReceiver, EventSender, event_channel};
pub use coordinator::Saga;
pub use error::SagaError;
pub use event_loop::{EventHandler, EventLoop};
pub use events::{SagaEvent, WalletEvent};
pub use order::{Order, SubmitOrder};
pub use services::{Account, CreditLedger, OrderTracker};
pub use state::OrderState;
