//! Ordered point-to-point event streams between the two services.

use tokio::sync::mpsc;

use crate::error::{Result, SagaError};
use crate::events::SagaEvent;

/// Sending half of an event stream.
pub type EventSender = mpsc::UnboundedSender<SagaEvent>;

/// Receiving half of an event stream. Exactly one consumer owns it.
pub type EventReceiver = mpsc::UnboundedReceiver<SagaEvent>;

/// Creates an unbounded stream that delivers events in send order.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Publishes `event`, failing only if the consumer has gone away.
pub(crate) fn publish(outbound: &EventSender, event: impl Into<SagaEvent>) -> Result<()> {
    let event = event.into();
    tracing::debug!(event_type = event.event_type(), "publishing event");
    outbound.send(event).map_err(|_| SagaError::ChannelClosed)
}
