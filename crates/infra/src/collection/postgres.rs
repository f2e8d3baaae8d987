//! Postgres-backed document collection.
//!
//! Documents are stored as JSONB rows keyed by `(entity_kind, id)` with a
//! `version` column enforcing optimistic concurrency. Conditional writes are
//! single statements, so the version check and the write are atomic; a losing
//! writer simply matches zero rows.
//!
//! ## Error Mapping
//!
//! | SQLx error | Postgres code | StoreError |
//! |------------|---------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | any | `Storage` |
//! | pool/network/decode | n/a | `Storage` |

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use tradepost_core::{Entity, ExpectedVersion};

use super::{Collection, StoreError, Versioned};

/// One entity type's documents in the shared `documents` table.
#[derive(Debug, Clone)]
pub struct PostgresCollection<T> {
    pool: PgPool,
    kind: &'static str,
    _marker: PhantomData<fn() -> T>,
}

/// Create the `documents` table if it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            entity_kind text NOT NULL,
            id uuid NOT NULL,
            version bigint NOT NULL,
            doc jsonb NOT NULL,
            updated_at timestamptz NOT NULL DEFAULT now(),
            PRIMARY KEY (entity_kind, id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}

impl<T> PostgresCollection<T> {
    pub fn new(pool: PgPool, kind: &'static str) -> Self {
        Self {
            pool,
            kind,
            _marker: PhantomData,
        }
    }
}

impl<T> PostgresCollection<T>
where
    T: Entity + Serialize + DeserializeOwned + Send + Sync + 'static,
    T::Id: Copy + Into<Uuid>,
{
    #[instrument(skip(self), fields(kind = self.kind), err)]
    async fn get_async(&self, id: Uuid) -> Result<Option<Versioned<T>>, StoreError> {
        let row = sqlx::query(
            "SELECT doc, version FROM documents WHERE entity_kind = $1 AND id = $2",
        )
        .bind(self.kind)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let doc: serde_json::Value = row
            .try_get("doc")
            .map_err(|e| StoreError::Storage(format!("failed to read doc: {e}")))?;
        let version: i64 = row
            .try_get("version")
            .map_err(|e| StoreError::Storage(format!("failed to read version: {e}")))?;
        let value: T = serde_json::from_value(doc)
            .map_err(|e| StoreError::Storage(format!("document deserialization failed: {e}")))?;

        Ok(Some(Versioned {
            value,
            version: version as u64,
        }))
    }

    async fn put_async(
        &self,
        id: Uuid,
        doc: serde_json::Value,
        expected: ExpectedVersion,
    ) -> Result<u64, StoreError> {
        let row = match expected {
            ExpectedVersion::Exact(0) => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (entity_kind, id, version, doc)
                    VALUES ($1, $2, 1, $3)
                    ON CONFLICT (entity_kind, id) DO NOTHING
                    RETURNING version
                    "#,
                )
                .bind(self.kind)
                .bind(id)
                .bind(&doc)
                .fetch_optional(&self.pool)
                .await
            }
            ExpectedVersion::Exact(v) => {
                sqlx::query(
                    r#"
                    UPDATE documents
                    SET doc = $3, version = version + 1, updated_at = now()
                    WHERE entity_kind = $1 AND id = $2 AND version = $4
                    RETURNING version
                    "#,
                )
                .bind(self.kind)
                .bind(id)
                .bind(&doc)
                .bind(v as i64)
                .fetch_optional(&self.pool)
                .await
            }
            ExpectedVersion::Any => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (entity_kind, id, version, doc)
                    VALUES ($1, $2, 1, $3)
                    ON CONFLICT (entity_kind, id) DO UPDATE
                    SET doc = excluded.doc,
                        version = documents.version + 1,
                        updated_at = now()
                    RETURNING version
                    "#,
                )
                .bind(self.kind)
                .bind(id)
                .bind(&doc)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("put", e))?;

        let Some(row) = row else {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, document was at another revision"
            )));
        };

        let version: i64 = row
            .try_get("version")
            .map_err(|e| StoreError::Storage(format!("failed to read version: {e}")))?;
        Ok(version as u64)
    }

    async fn remove_async(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE entity_kind = $1 AND id = $2")
            .bind(self.kind)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_async(&self) -> Result<Vec<T>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM documents WHERE entity_kind = $1 ORDER BY id")
            .bind(self.kind)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let doc: serde_json::Value = row
                .try_get("doc")
                .map_err(|e| StoreError::Storage(format!("failed to read doc: {e}")))?;
            let value: T = serde_json::from_value(doc).map_err(|e| {
                StoreError::Storage(format!("document deserialization failed: {e}"))
            })?;
            out.push(value);
        }
        Ok(out)
    }
}

impl<T> Collection<T> for PostgresCollection<T>
where
    T: Entity + Serialize + DeserializeOwned + Send + Sync + 'static,
    T::Id: Copy + Into<Uuid> + Send + Sync,
{
    fn get(&self, id: &T::Id) -> Result<Option<Versioned<T>>, StoreError> {
        bridge(self.get_async((*id).into()))?
    }

    fn put(&self, value: T, expected: ExpectedVersion) -> Result<u64, StoreError> {
        let id: Uuid = (*value.id()).into();
        let doc = serde_json::to_value(&value)
            .map_err(|e| StoreError::Storage(format!("document serialization failed: {e}")))?;
        bridge(self.put_async(id, doc, expected))?
    }

    fn remove(&self, id: &T::Id) -> Result<bool, StoreError> {
        bridge(self.remove_async((*id).into()))?
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        bridge(self.list_async())?
    }
}

/// The Collection trait is synchronous but sqlx is async; bridge via the
/// ambient tokio runtime (present under axum handlers). `block_in_place`
/// keeps the executor alive while this worker blocks, which requires the
/// multi-threaded runtime.
fn bridge<F>(fut: F) -> Result<F::Output, StoreError>
where
    F: Future,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Storage(
            "PostgresCollection requires an async runtime (tokio). Ensure you're calling from within a tokio runtime context.".to_string(),
        )
    })?;
    Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => {
            if db.code().as_deref() == Some("23505") {
                StoreError::Duplicate(format!("{operation}: {}", db.message()))
            } else {
                StoreError::Storage(format!("{operation}: {}", db.message()))
            }
        }
        _ => StoreError::Storage(format!("{operation}: {err}")),
    }
}
