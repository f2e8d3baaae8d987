use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for an event, containing entity stream metadata.
///
/// This is the unit published to the bus after a successful store write.
///
/// Notes:
/// - `entity_kind` + `entity_id` identify the document the event belongs to.
/// - `sequence_number` is the store revision the event was committed at.
/// - `payload` is the domain-agnostic event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,

    entity_kind: String,
    entity_id: Uuid,

    /// Store revision of the entity when this event was committed.
    sequence_number: u64,

    /// Stable event type name, e.g. `catalog.product.rejected`. Consumers
    /// dispatch on this rather than inspecting the payload shape.
    event_type: String,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        entity_kind: impl Into<String>,
        entity_id: Uuid,
        sequence_number: u64,
        event_type: impl Into<String>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            entity_kind: entity_kind.into(),
            entity_id,
            sequence_number,
            event_type: event_type.into(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn entity_kind(&self) -> &str {
        &self.entity_kind
    }

    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
