//! Metadata store: cached catalog facts read from the backend on first use.

use super::cache::ReadThroughCache;
use super::types::{ColumnDescriptor, SchemaRef, TableRef, TableShape};
use crate::backend::{Backend, BackendError};
use crate::error::AppError;
use crate::sql::is_valid_identifier;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Catalog lookups, memoized until [`MetadataStore::invalidate`].
pub struct MetadataStore {
    backend: Arc<dyn Backend>,
    timeout: Duration,
    schemas: ReadThroughCache<(), Arc<Vec<SchemaRef>>>,
    tables: ReadThroughCache<SchemaRef, Arc<Vec<String>>>,
    shapes: ReadThroughCache<TableRef, Arc<TableShape>>,
}

impl MetadataStore {
    pub fn new(backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        MetadataStore {
            backend,
            timeout,
            schemas: ReadThroughCache::new(),
            tables: ReadThroughCache::new(),
            shapes: ReadThroughCache::new(),
        }
    }

    pub async fn list_schemas(&self) -> Result<Arc<Vec<SchemaRef>>, AppError> {
        self.schemas
            .get_or_populate(&(), || async {
                tracing::debug!("catalog miss: schemas");
                let names = bounded(self.timeout, self.backend.list_schemas()).await?;
                Ok::<_, AppError>(Arc::new(
                    names
                        .iter()
                        .filter(|n| exposable("schema", n))
                        .filter_map(|n| SchemaRef::parse(n).ok())
                        .collect(),
                ))
            })
            .await
    }

    /// Fails with `NotFound` when `schema` is not among [`Self::list_schemas`].
    pub async fn list_tables(&self, schema: &SchemaRef) -> Result<Arc<Vec<String>>, AppError> {
        if !self.list_schemas().await?.contains(schema) {
            return Err(AppError::not_found(format!("database {}", schema)));
        }
        self.tables
            .get_or_populate(schema, || async {
                tracing::debug!(schema = %schema, "catalog miss: tables");
                let names = bounded(self.timeout, self.backend.list_tables(schema)).await?;
                Ok::<_, AppError>(Arc::new(
                    names
                        .into_iter()
                        .filter(|n| exposable("table", n))
                        .collect(),
                ))
            })
            .await
    }

    /// Full column set and key shape of `table`. Unknown tables come back empty.
    pub async fn table_shape(&self, table: &TableRef) -> Result<Arc<TableShape>, AppError> {
        self.shapes
            .get_or_populate(table, || async {
                tracing::debug!(table = %table, "catalog miss: columns");
                let columns = bounded(self.timeout, self.backend.columns(table)).await?;
                Ok::<_, AppError>(Arc::new(TableShape::new(columns)))
            })
            .await
    }

    /// Shape of a table listed under an exposed schema; anything else is `NotFound`.
    pub async fn exposed_table(&self, table: &TableRef) -> Result<Arc<TableShape>, AppError> {
        if !self.list_tables(&table.schema).await?.contains(&table.name) {
            return Err(AppError::not_found(format!("table {}", table)));
        }
        let shape = self.table_shape(table).await?;
        if shape.is_empty() {
            return Err(AppError::not_found(format!("table {}", table)));
        }
        Ok(shape)
    }

    pub async fn columns(&self, table: &TableRef) -> Result<Vec<ColumnDescriptor>, AppError> {
        Ok(self.table_shape(table).await?.columns.clone())
    }

    /// The key shape: key column names in column order.
    pub async fn key_columns(&self, table: &TableRef) -> Result<Vec<String>, AppError> {
        Ok(self.table_shape(table).await?.key_shape())
    }

    /// Forget every cached catalog fact; the next lookups go to the backend.
    pub fn invalidate(&self) {
        self.schemas.invalidate();
        self.tables.invalidate();
        self.shapes.invalidate();
        tracing::info!("catalog cache invalidated");
    }
}

fn exposable(kind: &str, name: &str) -> bool {
    let ok = is_valid_identifier(name);
    if !ok {
        tracing::warn!(kind, name, "catalog name fails identifier rules, not exposed");
    }
    ok
}

/// Run one backend call under `timeout`, mapping failures into the error taxonomy.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, AppError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "backend call failed");
            Err(e.into())
        }
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "backend call timed out");
            Err(AppError::internal("backend call timed out"))
        }
    }
}
