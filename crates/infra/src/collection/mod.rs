//! Versioned document collections.
//!
//! Each entity type lives in its own collection, keyed by its typed id. Every
//! write carries an [`ExpectedVersion`]; two racing writers load the same
//! revision, both decide, and only the first conditional write lands. The
//! loser gets [`StoreError::Concurrency`] and must reload.

mod in_memory;
mod postgres;

use std::sync::Arc;

use thiserror::Error;

use tradepost_accounts::UserProfile;
use tradepost_billing::SubscriptionPlan;
use tradepost_catalog::{Category, Product};
use tradepost_core::{DomainError, Entity, ExpectedVersion};
use tradepost_sourcing::SourcingRequest;

pub use in_memory::InMemoryCollection;
pub use postgres::{PostgresCollection, ensure_schema};

/// Collection operation error.
///
/// Infrastructure failures (storage, concurrency) as opposed to domain
/// errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("unique constraint violated: {0}")]
    Duplicate(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Concurrency(msg) => DomainError::conflict(msg),
            StoreError::Duplicate(field) => DomainError::duplicate_field(field),
            StoreError::Storage(msg) => {
                DomainError::invariant(format!("storage failure: {msg}"))
            }
        }
    }
}

/// A document plus the store revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    /// Revision of the stored document. New documents land at 1.
    pub version: u64,
}

/// Versioned key/value collection for one entity type.
///
/// The trait is synchronous; persistent implementations bridge to async
/// internally (see [`PostgresCollection`]).
pub trait Collection<T: Entity>: Send + Sync {
    fn get(&self, id: &T::Id) -> Result<Option<Versioned<T>>, StoreError>;

    /// Conditionally write `value` at `expected`. Returns the new revision.
    ///
    /// `ExpectedVersion::Exact(0)` means "insert, must not exist yet".
    fn put(&self, value: T, expected: ExpectedVersion) -> Result<u64, StoreError>;

    /// Remove a document. Returns whether it existed.
    fn remove(&self, id: &T::Id) -> Result<bool, StoreError>;

    fn list(&self) -> Result<Vec<T>, StoreError>;
}

impl<T, S> Collection<T> for Arc<S>
where
    T: Entity,
    S: Collection<T> + ?Sized,
{
    fn get(&self, id: &T::Id) -> Result<Option<Versioned<T>>, StoreError> {
        (**self).get(id)
    }

    fn put(&self, value: T, expected: ExpectedVersion) -> Result<u64, StoreError> {
        (**self).put(value, expected)
    }

    fn remove(&self, id: &T::Id) -> Result<bool, StoreError> {
        (**self).remove(id)
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        (**self).list()
    }
}

/// The typed collections backing the marketplace.
#[derive(Clone)]
pub struct EntityStore {
    pub users: Arc<dyn Collection<UserProfile>>,
    pub products: Arc<dyn Collection<Product>>,
    pub requests: Arc<dyn Collection<SourcingRequest>>,
    pub plans: Arc<dyn Collection<SubscriptionPlan>>,
    pub categories: Arc<dyn Collection<Category>>,
}

impl EntityStore {
    /// All-in-memory store for tests and local development.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryCollection::new()),
            products: Arc::new(InMemoryCollection::new()),
            requests: Arc::new(InMemoryCollection::new()),
            plans: Arc::new(InMemoryCollection::new()),
            categories: Arc::new(InMemoryCollection::new()),
        }
    }

    /// Postgres-backed store sharing one connection pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PostgresCollection::new(pool.clone(), "user")),
            products: Arc::new(PostgresCollection::new(pool.clone(), "product")),
            requests: Arc::new(PostgresCollection::new(pool.clone(), "sourcing_request")),
            plans: Arc::new(PostgresCollection::new(pool.clone(), "subscription_plan")),
            categories: Arc::new(PostgresCollection::new(pool, "category")),
        }
    }
}
