use async_trait::async_trait;
use futures_util::TryStreamExt;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    DocumentId, DocumentStoreError, Filter, Result, UpdateSpec, document_id_of,
    store::DocumentStore,
};

/// PostgreSQL-backed document store.
///
/// Documents live in a single JSONB table keyed by `(collection, id)`.
/// Equality predicates are pushed down as JSONB containment; range predicates
/// are evaluated on the candidate rows. Updates lock the candidates with
/// `FOR UPDATE` so read-modify-write cycles are atomic per document.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        tracing::info!("connected to PostgreSQL document store");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("document store migrations applied");
        Ok(())
    }

    /// Locks the candidate rows and returns the first that satisfies the filter.
    async fn lock_first_match(
        tx: &mut Transaction<'_, Postgres>,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<(Uuid, Value)>> {
        let rows = sqlx::query(
            r#"
            SELECT id, body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY seq ASC
            FOR UPDATE
            "#,
        )
        .bind(collection)
        .bind(filter.equalities())
        .fetch_all(&mut **tx)
        .await?;

        for row in rows {
            let body: Value = row.try_get("body")?;
            if filter.matches(&body) {
                return Ok(Some((row.try_get("id")?, body)));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Value> {
        let equalities = filter.equalities();
        let mut rows = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY seq ASC
            "#,
        )
        .bind(collection)
        .bind(&equalities)
        .fetch(&self.pool);

        while let Some(row) = rows.try_next().await? {
            let body: Value = row.try_get("body")?;
            if filter.matches(&body) {
                return Ok(body);
            }
        }
        Err(DocumentStoreError::not_found(collection))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let rows = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY seq ASC
            "#,
        )
        .bind(collection)
        .bind(filter.equalities())
        .fetch_all(&self.pool)
        .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let body: Value = row.try_get("body")?;
            if filter.matches(&body) {
                documents.push(body);
            }
        }
        Ok(documents)
    }

    async fn insert_one(&self, collection: &str, document: Value) -> Result<DocumentId> {
        let id = document_id_of(&document)?;

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id.as_uuid())
            .bind(&document)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("documents_pkey")
                {
                    tracing::debug!(collection, %id, "duplicate document id");
                    return DocumentStoreError::DuplicateId {
                        collection: collection.to_string(),
                        id,
                    };
                }
                DocumentStoreError::Database(e)
            })?;

        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let Some((id, mut body)) = Self::lock_first_match(&mut tx, collection, filter).await? else {
            tracing::debug!(collection, guarded = filter.has_ranges(), "update matched no document");
            return Err(DocumentStoreError::not_found(collection));
        };

        update.apply(&mut body)?;

        sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .bind(&body)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let (id, _) = Self::lock_first_match(&mut tx, collection, filter)
            .await?
            .ok_or_else(|| DocumentStoreError::not_found(collection))?;

        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
