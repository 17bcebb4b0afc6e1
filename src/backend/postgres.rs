//! PostgreSQL backend: information_schema catalog reads and statement execution over a PgPool.

use super::{Backend, BackendError, Row};
use crate::catalog::{ColumnDescriptor, ColumnType, SchemaRef, TableRef};
use crate::sql::{PgBindValue, Statement};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres};

const LIST_SCHEMAS: &str = r#"
SELECT schema_name::text
FROM   information_schema.schemata
WHERE  $1
   OR  (schema_name NOT IN ('pg_catalog', 'information_schema')
        AND schema_name NOT LIKE 'pg\_toast%'
        AND schema_name NOT LIKE 'pg\_temp\_%')
ORDER  BY schema_name
"#;

const LIST_TABLES: &str = r#"
SELECT table_name::text
FROM   information_schema.tables
WHERE  table_schema = $1
ORDER  BY table_name
"#;

const COLUMNS: &str = r#"
SELECT column_name::text, ordinal_position::int4, udt_schema::text, udt_name::text
FROM   information_schema.columns
WHERE  table_schema = $1 AND table_name = $2
ORDER  BY ordinal_position
"#;

/// Primary key first, then unique constraints by name.
const KEY_CONSTRAINTS: &str = r#"
SELECT t.constraint_name::text, k.column_name::text
FROM   information_schema.table_constraints t
JOIN   information_schema.key_column_usage k
  ON   k.constraint_schema = t.constraint_schema
 AND   k.constraint_name   = t.constraint_name
 AND   k.table_schema      = t.table_schema
 AND   k.table_name        = t.table_name
WHERE  t.table_schema = $1
  AND  t.table_name   = $2
  AND  t.constraint_type IN ('PRIMARY KEY', 'UNIQUE')
ORDER  BY (t.constraint_type = 'PRIMARY KEY') DESC, t.constraint_name, k.ordinal_position
"#;

#[derive(Clone, Debug, Default)]
pub struct PgBackendOptions {
    /// Expose pg_catalog, information_schema and the toast/temp schemas.
    pub include_system_schemas: bool,
}

#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
    options: PgBackendOptions,
}

impl PgBackend {
    pub fn new(pool: PgPool, options: PgBackendOptions) -> Self {
        PgBackend { pool, options }
    }

    /// One pooled connection per call; returned to the pool when dropped.
    async fn acquire(&self) -> Result<PoolConnection<Postgres>, BackendError> {
        self.pool.acquire().await.map_err(classify)
    }
}

#[async_trait]
impl Backend for PgBackend {
    async fn list_schemas(&self) -> Result<Vec<String>, BackendError> {
        let mut conn = self.acquire().await?;
        let rows: Vec<(String,)> = sqlx::query_as(LIST_SCHEMAS)
            .bind(self.options.include_system_schemas)
            .fetch_all(&mut *conn)
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn list_tables(&self, schema: &SchemaRef) -> Result<Vec<String>, BackendError> {
        let mut conn = self.acquire().await?;
        let rows: Vec<(String,)> = sqlx::query_as(LIST_TABLES)
            .bind(schema.as_str())
            .fetch_all(&mut *conn)
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn columns(&self, table: &TableRef) -> Result<Vec<ColumnDescriptor>, BackendError> {
        let mut conn = self.acquire().await?;
        let columns: Vec<(String, i32, String, String)> = sqlx::query_as(COLUMNS)
            .bind(table.schema.as_str())
            .bind(&table.name)
            .fetch_all(&mut *conn)
            .await
            .map_err(classify)?;
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let constraints: Vec<(String, String)> = sqlx::query_as(KEY_CONSTRAINTS)
            .bind(table.schema.as_str())
            .bind(&table.name)
            .fetch_all(&mut *conn)
            .await
            .map_err(classify)?;
        let key_columns = first_constraint_columns(&constraints);
        Ok(columns
            .into_iter()
            .map(|(name, ordinal, udt_schema, udt_name)| ColumnDescriptor {
                is_key: key_columns.contains(&name.as_str()),
                name,
                ordinal: u32::try_from(ordinal).unwrap_or(0),
                data_type: ColumnType::new(udt_schema, udt_name),
            })
            .collect())
    }

    async fn execute_query(&self, statement: &Statement) -> Result<Vec<Row>, BackendError> {
        tracing::debug!(sql = %statement.sql, params = ?statement.params, "query");
        let mut query = sqlx::query(&statement.sql);
        for p in &statement.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let mut conn = self.acquire().await?;
        let rows = query.fetch_all(&mut *conn).await.map_err(classify)?;
        Ok(rows.iter().map(row_to_values).collect())
    }

    async fn execute_command(&self, statement: &Statement) -> Result<u64, BackendError> {
        tracing::debug!(sql = %statement.sql, params = ?statement.params, "command");
        let mut query = sqlx::query(&statement.sql);
        for p in &statement.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let mut conn = self.acquire().await?;
        let done = query.execute(&mut *conn).await.map_err(classify)?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let mut conn = self.acquire().await?;
        sqlx::query("SELECT 1")
            .execute(&mut *conn)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// Columns of the first constraint in `rows` (rows are grouped by constraint name).
fn first_constraint_columns(rows: &[(String, String)]) -> Vec<&str> {
    let Some((first, _)) = rows.first() else {
        return Vec::new();
    };
    rows.iter()
        .take_while(|(constraint, _)| constraint == first)
        .map(|(_, column)| column.as_str())
        .collect()
}

fn classify(e: sqlx::Error) -> BackendError {
    match &e {
        sqlx::Error::Database(db) => {
            if db.is_unique_violation() {
                BackendError::UniqueViolation(db.message().to_string())
            } else if db.code().as_deref() == Some("42P01") {
                BackendError::UndefinedTable(db.message().to_string())
            } else {
                BackendError::Other(e.to_string())
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            BackendError::Unavailable(e.to_string())
        }
        _ => BackendError::Other(e.to_string()),
    }
}

fn row_to_values(row: &PgRow) -> Row {
    use sqlx::Row as _;
    (0..row.len()).map(|idx| cell_to_value(row, idx)).collect()
}

fn cell_to_value(row: &PgRow, idx: usize) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(idx) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(idx) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(idx) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(idx) {
        return j;
    }
    Value::Null
}
