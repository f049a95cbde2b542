use crate::infrastructure::{KeyValueStore, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{error, info, instrument};

/// Key-value store backed by a single `kv_store` table with JSONB values.
#[derive(Debug, Clone)]
pub struct PostgresKeyValueStore {
    pub pool: PgPool,
}

impl PostgresKeyValueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing table if it does not exist yet.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_store (key TEXT PRIMARY KEY, value JSONB NOT NULL)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create kv_store table");
            e
        })?;
        info!("kv_store table ready");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for PostgresKeyValueStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let value = sqlx::query_scalar::<_, Value>("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to read collection");
                e
            })?;
        Ok(value)
    }

    #[instrument(skip_all, fields(count = entries.len()))]
    async fn put_many(&self, entries: Vec<(String, Value)>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(
                "INSERT INTO kv_store (key, value) VALUES ($1, $2) ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
            )
            .bind(&key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(error = %e, key = %key, "Failed to write collection");
                e
            })?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn keys(&self) -> StoreResult<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }
}
