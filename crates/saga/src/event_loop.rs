//! Single-consumer event loop shared by both services.

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::channel::EventReceiver;
use crate::error::Result;
use crate::events::SagaEvent;

/// A service that reacts to events from its inbound stream.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Returns the service name used in logs.
    fn name(&self) -> &'static str;

    /// Handles a single event. Kinds the service does not consume are ignored.
    async fn handle(&self, event: SagaEvent) -> Result<()>;
}

/// Feeds events from one inbound stream to a handler, strictly one at a time.
pub struct EventLoop<H: EventHandler> {
    handler: H,
}

impl<H: EventHandler> EventLoop<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// Runs until the inbound stream closes.
    ///
    /// A failed event is logged and skipped; the loop keeps going.
    pub async fn run(self, mut inbound: EventReceiver) {
        let service = self.handler.name();
        tracing::info!(service, "event loop started");

        while let Some(event) = inbound.recv().await {
            let event_type = event.event_type();
            if let Err(e) = self.handler.handle(event).await {
                metrics::counter!("saga_event_failures_total", "service" => service).increment(1);
                tracing::warn!(service, event_type, error = %e, "failed to handle event");
            }
        }

        tracing::info!(service, "inbound channel closed, event loop stopping");
    }

    /// Spawns [`run`](Self::run) onto the current tokio runtime.
    pub fn spawn(self, inbound: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(self.run(inbound))
    }
}
