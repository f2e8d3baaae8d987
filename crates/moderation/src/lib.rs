//! `tradepost-moderation` — the status transition engine.
//!
//! Every moderated entity (product listing, sourcing request) shares the same
//! pending gate: created into `pending`, judged exactly once per submission by
//! an admin, and returned to `pending` on any owner edit that touches a
//! non-allow-listed field.

pub mod edit;
pub mod engine;
pub mod status;

pub use edit::{EditPolicy, status_after_edit};
pub use engine::{ModerationAction, ModerationEffect, Transition, transition};
pub use status::ModerationStatus;
