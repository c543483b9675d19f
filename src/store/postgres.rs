//! PostgreSQL store backend.
//!
//! Documents live in a single `documents` table keyed by `(collection, id)`
//! with the body in a JSONB column. Guarded commits run inside a database
//! transaction: each guarded row is locked with `FOR UPDATE`, its revision is
//! compared against the guard, and the batch only commits if every guard
//! holds. Plain reads take no locks.

use serde_json::Value;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};

use super::{
    Direction, Document, Filter, Guard, OrderBy, Revision, Store, StoreError, WriteBatch, WriteOp,
};
use async_trait::async_trait;

/// PostgreSQL-backed implementation of [`Store`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    /// Connect to PostgreSQL and build the connection pool.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Run schema migrations from the `migrations/` directory.
    ///
    /// Each migration is tracked and runs only once.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Text representation used when matching a filter against `doc ->> field`.
fn filter_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<(Revision, Value)> =
            sqlx::query_as("SELECT revision, doc FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(revision, body)| Document {
            id: id.to_string(),
            revision,
            body,
        }))
    }

    async fn put(&self, collection: &str, id: &str, body: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, revision, doc)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET revision = documents.revision + 1, doc = EXCLUDED.doc
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<bool, StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE documents
            SET revision = revision + 1, doc = doc || $3
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(fields)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }

    async fn commit(&self, guards: &[Guard], batch: WriteBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock every guarded row first; a revision that moved since the
        // caller's read aborts the whole batch.
        for guard in guards {
            let current: Option<Revision> = sqlx::query_scalar(
                "SELECT revision FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
            )
            .bind(guard.collection)
            .bind(&guard.id)
            .fetch_optional(&mut *tx)
            .await?;

            if current != guard.revision {
                tx.rollback().await?;
                return Err(StoreError::Conflict);
            }
        }

        for op in batch.ops {
            match op {
                WriteOp::Put { collection, id, body } => {
                    sqlx::query(
                        r#"
                        INSERT INTO documents (collection, id, revision, doc)
                        VALUES ($1, $2, 1, $3)
                        ON CONFLICT (collection, id)
                        DO UPDATE SET revision = documents.revision + 1, doc = EXCLUDED.doc
                        "#,
                    )
                    .bind(collection)
                    .bind(&id)
                    .bind(body)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteOp::Merge {
                    collection,
                    id,
                    fields,
                } => {
                    let updated = sqlx::query(
                        r#"
                        UPDATE documents
                        SET revision = revision + 1, doc = doc || $3
                        WHERE collection = $1 AND id = $2
                        "#,
                    )
                    .bind(collection)
                    .bind(&id)
                    .bind(fields)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

                    // Merging a row that vanished means a guard was missing.
                    if updated == 0 {
                        tx.rollback().await?;
                        return Err(StoreError::Conflict);
                    }
                }
                WriteOp::Delete { collection, id } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(collection)
                        .bind(&id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filter: Option<Filter>,
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        // Field names arrive as bound text operands; only the sort direction
        // is spliced into the SQL, and only from the two fixed keywords.
        let mut sql = String::from("SELECT id, revision, doc FROM documents WHERE collection = $1");
        let mut next_param = 2;

        if filter.is_some() {
            sql.push_str(&format!(
                " AND doc ->> ${} = ${}",
                next_param,
                next_param + 1
            ));
            next_param += 2;
        }
        if let Some(order) = order {
            let direction = match order.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY doc ->> ${next_param} {direction}"));
        }

        let mut query = sqlx::query_as::<_, (String, Revision, Value)>(&sql).bind(collection);
        if let Some(filter) = &filter {
            query = query.bind(filter.field).bind(filter_text(&filter.equals));
        }
        if let Some(order) = order {
            query = query.bind(order.field);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, revision, body)| Document { id, revision, body })
            .collect())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
