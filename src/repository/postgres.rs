//! PostgreSQL repository storing each entity as a JSONB document keyed by its id text.

use super::{required_id, KeyGenerator, Repository, Resource};
use crate::error::AppError;
use crate::query::{Filter, Page};
use crate::sql::{self, DocumentTable, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres, Row};
use std::marker::PhantomData;
use std::sync::Arc;

pub struct PgDocumentRepository<E: Resource> {
    pool: PgPool,
    table: DocumentTable,
    keys: Arc<dyn KeyGenerator<E::Id>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Resource> PgDocumentRepository<E> {
    /// Repository over `schema.<E::NAME>`. Call [`Self::ensure_table`] before first use.
    pub fn new(pool: PgPool, schema: &str, keys: Arc<dyn KeyGenerator<E::Id>>) -> Result<Self, AppError> {
        Ok(PgDocumentRepository {
            pool,
            table: DocumentTable::new(schema, E::NAME)?,
            keys,
            _entity: PhantomData,
        })
    }

    pub fn table(&self) -> &DocumentTable {
        &self.table
    }

    /// Creates the schema and table if missing.
    pub async fn ensure_table(&self) -> Result<(), AppError> {
        for q in [sql::create_schema(&self.table), sql::create_table(&self.table)] {
            tracing::debug!(sql = %q.sql, "ddl");
            sqlx::query(&q.sql).execute(&self.pool).await?;
        }
        tracing::info!(table = %self.table.qualified(), "document table ready");
        Ok(())
    }

    async fn fetch_document(&self, q: &QueryBuf) -> Result<Option<E>, AppError> {
        let row = bound(q).fetch_optional(&self.pool).await?;
        row.map(|r| document::<E>(&r)).transpose()
    }
}

fn bound(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}

fn document<E: Resource>(row: &PgRow) -> Result<E, AppError> {
    let value: Value = row.try_get("document")?;
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl<E: Resource> Repository<E> for PgDocumentRepository<E> {
    async fn find(&self, id: &E::Id) -> Result<Option<E>, AppError> {
        self.fetch_document(&sql::select_by_id(&self.table, &id.to_string())).await
    }

    async fn list(&self, filter: &Filter, page: Page) -> Result<Vec<E>, AppError> {
        let q = sql::select_list(&self.table, filter, page);
        let rows = bound(&q).fetch_all(&self.pool).await?;
        rows.iter().map(document::<E>).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<u64, AppError> {
        let q = sql::count(&self.table, filter);
        let row = bound(&q).fetch_one(&self.pool).await?;
        let n: i64 = row.try_get(0)?;
        Ok(n.max(0) as u64)
    }

    async fn insert(&self, mut entity: E) -> Result<E, AppError> {
        if entity.id().is_none() {
            entity.set_id(Some(self.keys.next_key()));
        }
        let id = required_id(&entity)?.to_string();
        let q = sql::insert(&self.table, &id, serde_json::to_value(&entity)?);
        self.fetch_document(&q)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("{} {} already exists", E::NAME, id)))
    }

    async fn save(&self, entity: E) -> Result<E, AppError> {
        let id = required_id(&entity)?.to_string();
        let q = sql::update(&self.table, &id, serde_json::to_value(&entity)?);
        self.fetch_document(&q)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", E::NAME, id)))
    }

    async fn insert_many(&self, entities: Vec<E>) -> Result<Vec<E>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut out = Vec::with_capacity(entities.len());
        for mut entity in entities {
            if entity.id().is_none() {
                entity.set_id(Some(self.keys.next_key()));
            }
            let id = required_id(&entity)?.to_string();
            let q = sql::insert(&self.table, &id, serde_json::to_value(&entity)?);
            let row = bound(&q)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::Conflict(format!("{} {} already exists", E::NAME, id)))?;
            out.push(document::<E>(&row)?);
        }
        tx.commit().await?;
        Ok(out)
    }

    async fn save_many(&self, entities: Vec<E>) -> Result<Vec<E>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut out = Vec::with_capacity(entities.len());
        for entity in entities {
            let id = required_id(&entity)?.to_string();
            let q = sql::update(&self.table, &id, serde_json::to_value(&entity)?);
            let row = bound(&q)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("{} {}", E::NAME, id)))?;
            out.push(document::<E>(&row)?);
        }
        tx.commit().await?;
        Ok(out)
    }

    async fn delete(&self, id: &E::Id) -> Result<bool, AppError> {
        let q = sql::delete(&self.table, &id.to_string());
        Ok(bound(&q).fetch_optional(&self.pool).await?.is_some())
    }

    async fn autocomplete(&self, field: &str, prefix: &str, limit: u32) -> Result<Vec<String>, AppError> {
        let q = sql::autocomplete(&self.table, field, prefix, limit);
        let rows = bound(&q).fetch_all(&self.pool).await?;
        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            let value: Option<String> = row.try_get("value")?;
            values.extend(value);
        }
        Ok(values)
    }
}
