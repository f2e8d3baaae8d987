//! Bus-to-notifier relay worker.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

use serde_json::Value as JsonValue;

use tradepost_events::{EventBus, EventEnvelope};

use super::{Notifier, render::notification_for};

/// Spawn a worker thread that turns committed events into notifications.
///
/// Must be called from within a tokio runtime; the worker captures the
/// runtime handle to drive the async notifier from its blocking receive loop.
/// Returns once the subscription is registered, so no event published after
/// this call is missed. The thread exits when the bus is dropped.
pub fn spawn_relay<B>(bus: Arc<B>, notifier: Arc<dyn Notifier>) -> JoinHandle<()>
where
    B: EventBus<EventEnvelope<JsonValue>> + Send + Sync + 'static,
{
    let handle = tokio::runtime::Handle::current();
    let (ready_tx, ready_rx) = mpsc::channel::<()>();

    let worker = std::thread::spawn(move || {
        let sub = bus.subscribe();
        let _ = ready_tx.send(());

        loop {
            match sub.recv() {
                Ok(envelope) => {
                    let Some(notification) = notification_for(&envelope) else {
                        continue;
                    };
                    // Fire-and-forget: a delivery failure never affects the
                    // decision that produced the event.
                    if let Err(e) = handle.block_on(notifier.send(notification)) {
                        tracing::warn!(
                            event_type = envelope.event_type(),
                            error = %e,
                            "notification delivery failed"
                        );
                    }
                }
                Err(_) => break,
            }
        }
    });

    let _ = ready_rx.recv_timeout(std::time::Duration::from_secs(1));
    worker
}
