use std::collections::HashMap;
use std::sync::RwLock;

use tradepost_core::{Entity, ExpectedVersion};

use super::{Collection, StoreError, Versioned};

/// In-memory versioned collection for tests/dev.
#[derive(Debug)]
pub struct InMemoryCollection<T: Entity> {
    inner: RwLock<HashMap<T::Id, Versioned<T>>>,
}

impl<T: Entity> InMemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Entity> Default for InMemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Collection<T> for InMemoryCollection<T>
where
    T: Entity + Clone + Send + Sync + 'static,
    T::Id: Send + Sync + 'static,
{
    fn get(&self, id: &T::Id) -> Result<Option<Versioned<T>>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(map.get(id).cloned())
    }

    fn put(&self, value: T, expected: ExpectedVersion) -> Result<u64, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        let current = map.get(value.id()).map(|v| v.version).unwrap_or(0);
        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found {current}"
            )));
        }

        let next = current + 1;
        map.insert(
            value.id().clone(),
            Versioned {
                value,
                version: next,
            },
        );
        Ok(next)
    }

    fn remove(&self, id: &T::Id) -> Result<bool, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(map.remove(id).is_some())
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(map.values().map(|v| v.value.clone()).collect())
    }
}
