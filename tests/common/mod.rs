#![allow(dead_code)]

use async_trait::async_trait;
use restguardian::catalog::{ColumnDescriptor, ColumnType, SchemaRef, TableRef};
use restguardian::record::scalar_text;
use restguardian::sql::{Statement, StatementShape};
use restguardian::{Backend, BackendError, RecordService, RecordValue, Row};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct MemoryTable {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Row>,
    /// Reject rows whose key equals an existing row's key.
    unique: bool,
}

impl MemoryTable {
    fn index(&self, column: &str) -> usize {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .expect("statement names a known column")
    }

    fn matches(&self, row: &Row, key_columns: &[String], key: &[Value]) -> bool {
        key_columns
            .iter()
            .zip(key)
            .all(|(c, v)| scalar_text(&row[self.index(c)]) == scalar_text(v))
    }

    fn key_of(&self, row: &Row) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_key)
            .map(|(i, _)| scalar_text(&row[i]))
            .collect()
    }

    fn clashes(&self, candidate: &Row, skip: Option<usize>) -> bool {
        self.unique
            && self
                .rows
                .iter()
                .enumerate()
                .any(|(i, r)| Some(i) != skip && self.key_of(r) == self.key_of(candidate))
    }

    fn row_from(&self, columns: &[String], values: &[Value]) -> Row {
        let mut row = vec![Value::Null; self.columns.len()];
        for (c, v) in columns.iter().zip(values) {
            row[self.index(c)] = v.clone();
        }
        row
    }
}

/// In-memory `Backend` that interprets statements from their shape and bound values.
#[derive(Default)]
pub struct MemoryBackend {
    schemas: Mutex<BTreeMap<String, BTreeMap<String, MemoryTable>>>,
    executed: Mutex<Vec<Statement>>,
    hidden: Mutex<BTreeSet<String>>,
    catalog_calls: AtomicUsize,
    commands: AtomicUsize,
    commands_miss: AtomicBool,
    down: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(self, schema: &str) -> Self {
        self.schemas.lock().unwrap().entry(schema.to_string()).or_default();
        self
    }

    /// `columns` are `(name, is_key)` in table order.
    pub fn with_table(self, schema: &str, table: &str, columns: &[(&str, bool)], unique: bool) -> Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(i, (name, is_key))| ColumnDescriptor {
                name: name.to_string(),
                ordinal: i as u32 + 1,
                is_key: *is_key,
                data_type: ColumnType::builtin("text"),
            })
            .collect();
        self.schemas
            .lock()
            .unwrap()
            .entry(schema.to_string())
            .or_default()
            .insert(
                table.to_string(),
                MemoryTable {
                    columns,
                    rows: Vec::new(),
                    unique,
                },
            );
        self
    }

    pub fn seed(&self, schema: &str, table: &str, row: Row) {
        let mut schemas = self.schemas.lock().unwrap();
        let table = schemas.get_mut(schema).unwrap().get_mut(table).unwrap();
        table.rows.push(row);
    }

    pub fn row_count(&self, schema: &str, table: &str) -> Option<usize> {
        let schemas = self.schemas.lock().unwrap();
        schemas.get(schema)?.get(table).map(|t| t.rows.len())
    }

    pub fn executed(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }

    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    /// Leave `schema` out of `list_schemas` while its tables still answer `columns`.
    pub fn hide_schema(&self, schema: &str) {
        self.hidden.lock().unwrap().insert(schema.to_string());
    }

    /// Make every command affect zero rows, as if a concurrent writer got there first.
    pub fn set_commands_miss(&self, miss: bool) {
        self.commands_miss.store(miss, Ordering::SeqCst);
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    async fn enter(&self) -> Result<(), BackendError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("connection refused".into()));
        }
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        Ok(())
    }

    fn with_table_mut<T>(
        &self,
        table: &TableRef,
        f: impl FnOnce(&mut MemoryTable) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let mut schemas = self.schemas.lock().unwrap();
        let t = schemas
            .get_mut(table.schema.as_str())
            .and_then(|s| s.get_mut(&table.name))
            .ok_or_else(|| BackendError::UndefinedTable(table.to_string()))?;
        f(t)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_schemas(&self) -> Result<Vec<String>, BackendError> {
        self.enter().await?;
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        let hidden = self.hidden.lock().unwrap();
        let names = self
            .schemas
            .lock()
            .unwrap()
            .keys()
            .filter(|s| !hidden.contains(*s))
            .cloned()
            .collect();
        Ok(names)
    }

    async fn list_tables(&self, schema: &SchemaRef) -> Result<Vec<String>, BackendError> {
        self.enter().await?;
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .schemas
            .lock()
            .unwrap()
            .get(schema.as_str())
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn columns(&self, table: &TableRef) -> Result<Vec<ColumnDescriptor>, BackendError> {
        self.enter().await?;
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .schemas
            .lock()
            .unwrap()
            .get(table.schema.as_str())
            .and_then(|s| s.get(&table.name))
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn execute_query(&self, statement: &Statement) -> Result<Vec<Row>, BackendError> {
        self.enter().await?;
        self.executed.lock().unwrap().push(statement.clone());
        let params = &statement.params;
        match &statement.shape {
            StatementShape::ListKeys { table, key_columns } => self.with_table_mut(table, |t| {
                let idx: Vec<usize> = key_columns.iter().map(|c| t.index(c)).collect();
                Ok(t.rows.iter().map(|r| idx.iter().map(|i| r[*i].clone()).collect()).collect())
            }),
            StatementShape::GetOne {
                table,
                columns,
                key_columns,
            } => self.with_table_mut(table, |t| {
                let idx: Vec<usize> = columns.iter().map(|c| t.index(c)).collect();
                Ok(t.rows
                    .iter()
                    .filter(|r| t.matches(r, key_columns, params))
                    .take(2)
                    .map(|r| idx.iter().map(|i| r[*i].clone()).collect())
                    .collect())
            }),
            other => Err(BackendError::Other(format!("{} is not a query", other.kind()))),
        }
    }

    async fn execute_command(&self, statement: &Statement) -> Result<u64, BackendError> {
        self.enter().await?;
        self.executed.lock().unwrap().push(statement.clone());
        self.commands.fetch_add(1, Ordering::SeqCst);
        if self.commands_miss.load(Ordering::SeqCst) {
            return Ok(0);
        }
        let params = &statement.params;
        match &statement.shape {
            StatementShape::Insert { table, columns } => self.with_table_mut(table, |t| {
                let row = t.row_from(columns, params);
                if t.clashes(&row, None) {
                    return Err(BackendError::UniqueViolation("duplicate key".into()));
                }
                t.rows.push(row);
                Ok(1)
            }),
            StatementShape::Update {
                table,
                columns,
                key_columns,
            } => self.with_table_mut(table, |t| {
                let (values, key) = params.split_at(columns.len());
                let Some(pos) = t.rows.iter().position(|r| t.matches(r, key_columns, key)) else {
                    return Ok(0);
                };
                let row = t.row_from(columns, values);
                if t.clashes(&row, Some(pos)) {
                    return Err(BackendError::UniqueViolation("duplicate key".into()));
                }
                t.rows[pos] = row;
                Ok(1)
            }),
            StatementShape::Delete { table, key_columns } => self.with_table_mut(table, |t| {
                let pos = t.rows.iter().position(|r| t.matches(r, key_columns, params));
                match pos {
                    Some(pos) => {
                        t.rows.remove(pos);
                        Ok(1)
                    }
                    None => Ok(0),
                }
            }),
            other => Err(BackendError::Other(format!("{} is not a command", other.kind()))),
        }
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.enter().await
    }
}

/// `app.users(id key, name)` with enforced key uniqueness.
pub fn users_backend() -> MemoryBackend {
    MemoryBackend::new().with_table("app", "users", &[("id", true), ("name", false)], true)
}

pub fn service(backend: &Arc<MemoryBackend>) -> RecordService {
    RecordService::new(backend.clone(), Duration::from_secs(2))
}

pub fn record(pairs: &[(&str, Value)]) -> RecordValue {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}
