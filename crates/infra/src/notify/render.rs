//! Maps committed event envelopes to user-facing notifications.

use serde_json::Value as JsonValue;

use tradepost_core::UserId;
use tradepost_events::EventEnvelope;

use super::Notification;

/// Render the notification (if any) for a committed event.
///
/// Only moderation outcomes notify; submissions and edits stay quiet.
/// Rejection reasons are carried into the message verbatim.
pub fn notification_for(envelope: &EventEnvelope<JsonValue>) -> Option<Notification> {
    let (recipient, reason) = event_fields(envelope.payload());

    match envelope.event_type() {
        "catalog.product.approved" => Some(Notification {
            recipient: recipient?,
            subject: "Your product listing was approved".to_string(),
            body: "Your product listing has been approved and is now live.".to_string(),
        }),
        "catalog.product.rejected" => Some(Notification {
            recipient: recipient?,
            subject: "Your product listing was rejected".to_string(),
            body: format!("Your product listing was rejected: {}", reason?),
        }),
        "sourcing.request.approved" => Some(Notification {
            recipient: recipient?,
            subject: "Your sourcing request was approved".to_string(),
            body: "Your sourcing request has been approved and is now visible to sellers."
                .to_string(),
        }),
        "sourcing.request.rejected" => Some(Notification {
            recipient: recipient?,
            subject: "Your sourcing request was rejected".to_string(),
            body: format!("Your sourcing request was rejected: {}", reason?),
        }),
        "accounts.verification.approved" => Some(Notification {
            recipient: recipient?,
            subject: "Your account was verified".to_string(),
            body: "Your verification documents have been approved.".to_string(),
        }),
        "accounts.verification.rejected" => Some(Notification {
            recipient: recipient?,
            subject: "Your verification was rejected".to_string(),
            body: format!("Your verification was rejected: {}", reason?),
        }),
        _ => None,
    }
}

/// Pull the recipient and optional reason out of an externally-tagged event
/// payload, whichever domain it came from.
fn event_fields(payload: &JsonValue) -> (Option<UserId>, Option<String>) {
    let Some(inner) = payload.as_object().and_then(|o| o.values().next()) else {
        return (None, None);
    };

    let recipient = ["seller_id", "buyer_id", "user_id"]
        .iter()
        .find_map(|k| inner.get(*k))
        .and_then(|v| serde_json::from_value::<UserId>(v.clone()).ok());
    let reason = inner
        .get("reason")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    (recipient, reason)
}
