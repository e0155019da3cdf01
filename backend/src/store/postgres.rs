//! PostgreSQL JSONB document store
//!
//! Every document is one row of the `documents` table keyed by its full
//! path. `parent` holds the collection path so listing a collection is a
//! single indexed lookup. Merges use the JSONB `||` operator, which is a
//! shallow merge of top-level keys.

use super::{paths, BatchWrite, DocumentStore, TransactionFn, TransactionOutcome, WriteBatch};
use crate::db;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    path: String,
    data: Value,
}

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const MERGE_SQL: &str = r#"
    INSERT INTO documents (path, parent, data, updated_at)
    VALUES ($1, $2, $3, NOW())
    ON CONFLICT (path) DO UPDATE
    SET data = CASE
            WHEN jsonb_typeof(documents.data) = 'object' THEN documents.data || EXCLUDED.data
            ELSE EXCLUDED.data
        END,
        updated_at = NOW()
"#;

const SET_SQL: &str = r#"
    INSERT INTO documents (path, parent, data, updated_at)
    VALUES ($1, $2, $3, NOW())
    ON CONFLICT (path) DO UPDATE
    SET data = EXCLUDED.data, updated_at = NOW()
"#;

async fn write_one(tx: &mut Transaction<'_, Postgres>, write: BatchWrite) -> Result<()> {
    let (sql, path, data) = match write {
        BatchWrite::Merge { path, data } => (MERGE_SQL, path, data),
        BatchWrite::Set { path, data } => (SET_SQL, path, data),
    };
    sqlx::query(sql)
        .bind(&path)
        .bind(paths::parent_of(&path))
        .bind(data)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT path, data FROM documents WHERE path = $1",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.data))
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT path, data FROM documents WHERE parent = $1 ORDER BY path ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (paths::id_of(&r.path).to_string(), r.data))
            .collect())
    }

    async fn merge(&self, path: &str, data: Value) -> Result<()> {
        sqlx::query(MERGE_SQL)
            .bind(path)
            .bind(paths::parent_of(path))
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn transaction(&self, path: &str, update: TransactionFn) -> Result<TransactionOutcome> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, DocumentRow>(
            "SELECT path, data FROM documents WHERE path = $1 FOR UPDATE",
        )
        .bind(path)
        .fetch_optional(&mut *tx)
        .await?
        .map(|r| r.data);

        match update(current)? {
            Some(next) => {
                write_one(
                    &mut tx,
                    BatchWrite::Set {
                        path: path.to_string(),
                        data: next,
                    },
                )
                .await?;
                tx.commit().await?;
                Ok(TransactionOutcome::Committed)
            }
            None => {
                tx.rollback().await?;
                Ok(TransactionOutcome::Unchanged)
            }
        }
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for write in batch.into_writes() {
            write_one(&mut tx, write).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        db::health_check(&self.pool).await
    }
}
