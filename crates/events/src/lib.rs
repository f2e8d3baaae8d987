//! `tradepost-events` — domain events and the pub/sub bus abstraction.
//!
//! Successful status transitions emit events; the notification pipeline
//! consumes them off the bus, decoupled from the transition's own outcome.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
