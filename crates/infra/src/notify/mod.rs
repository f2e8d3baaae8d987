//! Notification delivery.
//!
//! Moderation outcomes notify the affected user. Delivery is fire-and-forget:
//! a failed send is logged and dropped, never rolled back into the decision
//! that triggered it.

mod relay;
mod render;

use std::sync::Mutex;

use tradepost_core::UserId;

pub use relay::spawn_relay;
pub use render::notification_for;

/// A rendered message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: UserId,
    pub subject: String,
    pub body: String,
}

/// Outbound notification channel (email, push, webhook...).
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Notifier that only logs. Default for local development.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> anyhow::Result<()> {
        tracing::info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "notification dispatched"
        );
        Ok(())
    }
}

/// Notifier capturing everything sent, for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> anyhow::Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("lock poisoned"))?
            .push(notification);
        Ok(())
    }
}
