//! Backend capability: catalog reads and statement execution against one SQL engine.

mod postgres;

pub use postgres::{PgBackend, PgBackendOptions};

use crate::catalog::{ColumnDescriptor, SchemaRef, TableRef};
use crate::error::AppError;
use crate::sql::Statement;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// One result row, positional in the order of the statement's select list.
pub type Row = Vec<Value>;

/// Driver failures, classified by the backend so the record layer never inspects driver types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("undefined table: {0}")]
    UndefinedTable(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend failure: {0}")]
    Other(String),
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::UniqueViolation(m) => AppError::already_exists(m),
            BackendError::UndefinedTable(m) => AppError::not_found(m),
            BackendError::Unavailable(m) | BackendError::Other(m) => AppError::internal(m),
        }
    }
}

/// A SQL engine the record layer can run against. Each call acquires its own
/// connection and releases it before returning, including when the future is dropped.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Names of all visible schemas.
    async fn list_schemas(&self) -> Result<Vec<String>, BackendError>;

    /// Names of all tables in `schema`.
    async fn list_tables(&self, schema: &SchemaRef) -> Result<Vec<String>, BackendError>;

    /// Columns of `table` with key membership. Unknown tables yield an empty list.
    async fn columns(&self, table: &TableRef) -> Result<Vec<ColumnDescriptor>, BackendError>;

    async fn execute_query(&self, statement: &Statement) -> Result<Vec<Row>, BackendError>;

    /// Returns the affected row count.
    async fn execute_command(&self, statement: &Statement) -> Result<u64, BackendError>;

    async fn ping(&self) -> Result<(), BackendError>;
}
