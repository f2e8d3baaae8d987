//! `tradepost-accounts` — user profiles and the verification lifecycle.
//!
//! Verification is country-sensitive twice over: the required document set is
//! chosen by country, and country-scoped detail values (tax ids and the like)
//! must be unique per country.

pub mod reverification;
pub mod uniqueness;
pub mod user;

pub use reverification::{Reverification, evaluate};
pub use uniqueness::{find_scoped_duplicate, scoped_key};
pub use user::{
    NewUser, ProfileChanges, Subscription, UserEvent, UserProfile, VerificationStatus,
};
