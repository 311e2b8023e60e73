//! Builds parameterized statements over document tables.
//! Identifiers come from validated configuration only; values are always bound.

use super::params::PgBindValue;
use crate::config::validate_identifier;
use crate::error::ConfigError;
use crate::query::{Condition, Filter, Page};
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Escape `LIKE` metacharacters so the prefix matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 1);
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// One resource table: `id TEXT PRIMARY KEY, document JSONB, updated_at TIMESTAMPTZ`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentTable {
    schema: String,
    table: String,
}

impl DocumentTable {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Result<Self, ConfigError> {
        let (schema, table) = (schema.into(), table.into());
        validate_identifier(&schema)?;
        validate_identifier(&table)?;
        Ok(DocumentTable { schema, table })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Full qualified table name.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(&self.table))
    }
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        Self::default()
    }

    fn push_param(&mut self, v: impl Into<PgBindValue>) -> usize {
        self.params.push(v.into());
        self.params.len()
    }

    /// Appends ` WHERE ...` for a non-empty filter, binding every value.
    fn push_filter(&mut self, filter: &Filter) {
        let mut parts = Vec::with_capacity(filter.conditions().len());
        for condition in filter.conditions() {
            let part = match condition {
                Condition::Equals { field, value } => {
                    let mut probe = Map::new();
                    probe.insert(field.clone(), value.clone());
                    let n = self.push_param(Value::Object(probe));
                    format!("document @> ${}::jsonb", n)
                }
                Condition::AnyOf { field, values } => {
                    let f = self.push_param(field.as_str());
                    let v = self.push_param(Value::Array(values.clone()));
                    format!("document -> ${} = ANY(ARRAY(SELECT jsonb_array_elements(${}::jsonb)))", f, v)
                }
                Condition::StartsWith { field, prefix } => {
                    let f = self.push_param(field.as_str());
                    let p = self.push_param(format!("{}%", escape_like(prefix)));
                    format!("document ->> ${} ILIKE ${}", f, p)
                }
            };
            parts.push(part);
        }
        if !parts.is_empty() {
            self.sql.push_str(" WHERE ");
            self.sql.push_str(&parts.join(" AND "));
        }
    }
}

pub fn create_schema(table: &DocumentTable) -> QueryBuf {
    QueryBuf {
        sql: format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(table.schema())),
        params: Vec::new(),
    }
}

pub fn create_table(table: &DocumentTable) -> QueryBuf {
    QueryBuf {
        sql: format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, document JSONB NOT NULL, updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
            table.qualified()
        ),
        params: Vec::new(),
    }
}

/// SELECT document by id. Binds the id as `$1`.
pub fn select_by_id(table: &DocumentTable, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(id);
    q.sql = format!("SELECT document FROM {} WHERE id = $1", table.qualified());
    q
}

/// SELECT documents matching `filter`, ordered by id text, windowed by `page`.
pub fn select_list(table: &DocumentTable, filter: &Filter, page: Page) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT document FROM {}", table.qualified());
    q.push_filter(filter);
    q.sql.push_str(&format!(" ORDER BY id LIMIT {} OFFSET {}", page.limit, page.offset));
    q
}

pub fn count(table: &DocumentTable, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", table.qualified());
    q.push_filter(filter);
    q
}

/// INSERT returning the stored document; no row comes back when the id is taken.
pub fn insert(table: &DocumentTable, id: &str, document: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(id);
    q.push_param(document);
    q.sql = format!(
        "INSERT INTO {} (id, document, updated_at) VALUES ($1, $2::jsonb, NOW()) ON CONFLICT (id) DO NOTHING RETURNING document",
        table.qualified()
    );
    q
}

/// UPDATE replacing the whole document; no row comes back when the id is absent.
pub fn update(table: &DocumentTable, id: &str, document: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(id);
    q.push_param(document);
    q.sql = format!(
        "UPDATE {} SET document = $2::jsonb, updated_at = NOW() WHERE id = $1 RETURNING document",
        table.qualified()
    );
    q
}

pub fn delete(table: &DocumentTable, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(id);
    q.sql = format!("DELETE FROM {} WHERE id = $1 RETURNING id", table.qualified());
    q
}

/// Distinct string values of `field` starting with `prefix`, case-insensitively, ascending.
pub fn autocomplete(table: &DocumentTable, field: &str, prefix: &str, limit: u32) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(field);
    q.push_param(format!("{}%", escape_like(prefix)));
    q.sql = format!(
        "SELECT DISTINCT document ->> $1 AS value FROM {} WHERE document ->> $1 ILIKE $2 ORDER BY value LIMIT {}",
        table.qualified(),
        limit
    );
    q
}
