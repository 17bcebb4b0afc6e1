//! Generic record CRUD over any table the catalog describes.
//!
//! Check-then-act sequences (get before delete/update) are not atomic: concurrent
//! writers to one key race and the last writer wins. No extra locking is taken.

use crate::backend::{Backend, Row};
use crate::catalog::{bounded, MetadataStore, SchemaRef, TableRef, TableShape};
use crate::codec::{self, PathToken};
use crate::error::AppError;
use crate::record::{RecordKey, RecordValue};
use crate::sql::{self, Statement};
use std::sync::Arc;
use std::time::Duration;

pub struct RecordService {
    backend: Arc<dyn Backend>,
    metadata: MetadataStore,
    timeout: Duration,
}

impl RecordService {
    /// `timeout` bounds every single backend call, catalog reads included.
    pub fn new(backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        RecordService {
            metadata: MetadataStore::new(backend.clone(), timeout),
            backend,
            timeout,
        }
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        bounded(self.timeout, self.backend.ping()).await
    }

    pub async fn list_databases(&self) -> Result<Vec<SchemaRef>, AppError> {
        Ok(self.metadata.list_schemas().await?.as_ref().clone())
    }

    pub async fn list_tables(&self, db: &str) -> Result<Vec<String>, AppError> {
        let schema = SchemaRef::parse(db)?;
        Ok(self.metadata.list_tables(&schema).await?.as_ref().clone())
    }

    /// Key of every record, in backend order.
    pub async fn list_record_keys(&self, db: &str, table: &str) -> Result<Vec<RecordKey>, AppError> {
        let (table, shape) = self.resolve(db, table).await?;
        let stmt = sql::list_keys(&table, &shape)?;
        let rows = self.query(&stmt).await?;
        Ok(rows.into_iter().map(RecordKey::new).collect())
    }

    /// The single record matching `key`. Zero or several matches are both `NotFound`.
    pub async fn get_record(&self, db: &str, table: &str, key: &RecordKey) -> Result<RecordValue, AppError> {
        let (table, shape) = self.resolve(db, table).await?;
        self.fetch_unique(&table, &shape, key).await
    }

    /// Insert a full record and return its key.
    pub async fn create_record(&self, db: &str, table: &str, value: &RecordValue) -> Result<RecordKey, AppError> {
        let (table, shape) = self.resolve(db, table).await?;
        let stmt = sql::insert(&table, &shape, value)?;
        self.command(&stmt).await?;
        tracing::debug!(table = %table, "record created");
        Ok(RecordKey::from_record(shape.key_shape().iter().map(String::as_str), value))
    }

    /// Replace every column of the record at `key`. Returns the key after the update,
    /// which differs from `key` when the value map changes key columns.
    pub async fn update_record(
        &self,
        db: &str,
        table: &str,
        key: &RecordKey,
        value: &RecordValue,
    ) -> Result<RecordKey, AppError> {
        let (table, shape) = self.resolve(db, table).await?;
        let stmt = sql::update(&table, &shape, key, value)?;
        self.fetch_unique(&table, &shape, key).await?;
        let affected = self.command(&stmt).await?;
        if affected == 0 {
            return Err(AppError::not_found(format!("record in {} vanished before update", table)));
        }
        tracing::debug!(table = %table, "record updated");
        Ok(RecordKey::from_record(shape.key_shape().iter().map(String::as_str), value))
    }

    /// Delete the record at `key`; absent records are `NotFound`, never a silent no-op.
    pub async fn delete_record(&self, db: &str, table: &str, key: &RecordKey) -> Result<(), AppError> {
        let (table, shape) = self.resolve(db, table).await?;
        let stmt = sql::delete(&table, &shape, key)?;
        self.fetch_unique(&table, &shape, key).await?;
        let affected = self.command(&stmt).await?;
        if affected == 0 {
            return Err(AppError::not_found(format!("record in {} vanished before delete", table)));
        }
        tracing::debug!(table = %table, "record deleted");
        Ok(())
    }

    /// Decode a path token against the table's key shape.
    pub async fn key_from_token(&self, db: &str, table: &str, token: &PathToken) -> Result<RecordKey, AppError> {
        let (_, shape) = self.resolve(db, table).await?;
        codec::decode(token, shape.key_len())
    }

    /// Validate names and load the shape of a table the catalog exposes.
    async fn resolve(&self, db: &str, table: &str) -> Result<(TableRef, Arc<TableShape>), AppError> {
        let table = TableRef::parse(db, table)?;
        let shape = self.metadata.exposed_table(&table).await?;
        Ok((table, shape))
    }

    async fn fetch_unique(&self, table: &TableRef, shape: &TableShape, key: &RecordKey) -> Result<RecordValue, AppError> {
        let stmt = sql::get_one(table, shape, key)?;
        let mut rows = self.query(&stmt).await?;
        if rows.len() != 1 {
            if rows.len() > 1 {
                tracing::warn!(table = %table, "key matched more than one record");
            }
            return Err(AppError::not_found(format!("record in {}", table)));
        }
        let row = rows.remove(0);
        Ok(shape
            .column_names()
            .map(str::to_string)
            .zip(row)
            .collect())
    }

    async fn query(&self, stmt: &Statement) -> Result<Vec<Row>, AppError> {
        tracing::debug!(kind = stmt.shape.kind(), table = %stmt.shape.table(), "execute query");
        bounded(self.timeout, self.backend.execute_query(stmt)).await
    }

    async fn command(&self, stmt: &Statement) -> Result<u64, AppError> {
        tracing::debug!(kind = stmt.shape.kind(), table = %stmt.shape.table(), "execute command");
        bounded(self.timeout, self.backend.execute_command(stmt)).await
    }
}

