//! Infrastructure layer: document collections, Postgres persistence, and
//! notification delivery.

pub mod collection;
pub mod notify;


pub use collection::{
    Collection, EntityStore, InMemoryCollection, StoreError, Versioned,
};
pub use notify::{LogNotifier, Notification, Notifier, RecordingNotifier};
