//! Builds parameterized list-keys, get-one, INSERT, UPDATE, DELETE from catalog metadata.
//! Every identifier is checked against the allow-list; every value is a bound parameter.

use crate::catalog::{ColumnDescriptor, TableRef, TableShape};
use crate::error::AppError;
use crate::record::{RecordKey, RecordValue};
use crate::sql::ident::{quoted, validate_identifier};
use serde_json::Value;

/// Rows fetched by get-one: two, so a non-unique key is told apart from a unique match.
pub const GET_ONE_FETCH: u32 = 2;

/// What a statement does and to which table. Parameter order per shape:
/// `GetOne`/`Delete` bind the key values; `Insert` binds `columns`; `Update` binds
/// `columns` followed by the key values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatementShape {
    ListKeys {
        table: TableRef,
        key_columns: Vec<String>,
    },
    GetOne {
        table: TableRef,
        columns: Vec<String>,
        key_columns: Vec<String>,
    },
    Insert {
        table: TableRef,
        columns: Vec<String>,
    },
    Update {
        table: TableRef,
        columns: Vec<String>,
        key_columns: Vec<String>,
    },
    Delete {
        table: TableRef,
        key_columns: Vec<String>,
    },
}

impl StatementShape {
    pub fn kind(&self) -> &'static str {
        match self {
            StatementShape::ListKeys { .. } => "list_keys",
            StatementShape::GetOne { .. } => "get_one",
            StatementShape::Insert { .. } => "insert",
            StatementShape::Update { .. } => "update",
            StatementShape::Delete { .. } => "delete",
        }
    }

    pub fn table(&self) -> &TableRef {
        match self {
            StatementShape::ListKeys { table, .. }
            | StatementShape::GetOne { table, .. }
            | StatementShape::Insert { table, .. }
            | StatementShape::Update { table, .. }
            | StatementShape::Delete { table, .. } => table,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    pub shape: StatementShape,
}

/// Statement text plus bound values under construction.
struct QueryBuf {
    sql: String,
    params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Bind `v` and return its placeholder, cast to the column's catalog type.
    fn push_param(&mut self, column: &ColumnDescriptor, v: Value) -> String {
        self.params.push(v);
        format!(
            "${}::{}.{}",
            self.params.len(),
            quoted(&column.data_type.schema),
            quoted(&column.data_type.name)
        )
    }

    fn finish(self, shape: StatementShape) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
            shape,
        }
    }
}

fn qualified_table(table: &TableRef) -> Result<String, AppError> {
    validate_identifier("database", table.schema.as_str())?;
    validate_identifier("table", &table.name)?;
    Ok(format!("{}.{}", quoted(table.schema.as_str()), quoted(&table.name)))
}

fn validate_column(column: &ColumnDescriptor) -> Result<(), AppError> {
    validate_identifier("column", &column.name)?;
    validate_identifier("type schema", &column.data_type.schema)?;
    validate_identifier("type", &column.data_type.name)
}

fn validated_columns<'a>(
    columns: impl Iterator<Item = &'a ColumnDescriptor>,
) -> Result<Vec<&'a ColumnDescriptor>, AppError> {
    columns
        .map(|c| validate_column(c).map(|_| c))
        .collect()
}

/// SELECT list entry: native types as-is, anything else as text.
fn select_expr(column: &ColumnDescriptor) -> String {
    let q = quoted(&column.name);
    if column.data_type.decodes_natively() {
        q
    } else {
        format!("{}::text AS {}", q, q)
    }
}

fn names(columns: &[&ColumnDescriptor]) -> Vec<String> {
    columns.iter().map(|c| c.name.clone()).collect()
}

fn ensure_key_len(shape: &TableShape, key: &RecordKey) -> Result<(), AppError> {
    let expected = shape.key_len();
    if key.len() != expected {
        return Err(AppError::data_invalid(format!(
            "key has {} values, table key has {} columns",
            key.len(),
            expected
        )));
    }
    Ok(())
}

/// The value map must name exactly the table's columns, no more and no fewer.
pub fn ensure_full_column_set(shape: &TableShape, value: &RecordValue) -> Result<(), AppError> {
    let missing: Vec<&str> = shape.column_names().filter(|c| !value.contains_key(*c)).collect();
    let mut extra: Vec<&str> = value
        .keys()
        .map(String::as_str)
        .filter(|k| shape.column(k).is_none())
        .collect();
    extra.sort_unstable();
    if missing.is_empty() && extra.is_empty() {
        return Ok(());
    }
    Err(AppError::data_invalid(format!(
        "column set mismatch (missing: [{}], unexpected: [{}])",
        missing.join(", "),
        extra.join(", ")
    )))
}

/// `"k1" = $n AND "k2" = $m`; empty when the table has no key columns.
fn key_predicate(q: &mut QueryBuf, keys: &[&ColumnDescriptor], key: &RecordKey) -> String {
    keys.iter()
        .zip(key.values())
        .map(|(c, v)| {
            let ph = q.push_param(c, v.clone());
            format!("{} = {}", quoted(&c.name), ph)
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn where_clause(predicate: &str) -> String {
    if predicate.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicate)
    }
}

/// Restrict a write to at most one row matching `predicate`.
fn single_row_target(table: &str, predicate: &str) -> String {
    format!(
        " WHERE (tableoid, ctid) = (SELECT tableoid, ctid FROM {}{} LIMIT 1)",
        table,
        where_clause(predicate)
    )
}

/// SELECT key columns of every row. No ordering is imposed.
pub fn list_keys(table: &TableRef, shape: &TableShape) -> Result<Statement, AppError> {
    let mut q = QueryBuf::new();
    let qualified = qualified_table(table)?;
    let keys = validated_columns(shape.key_columns())?;
    let cols = keys.iter().map(|c| select_expr(c)).collect::<Vec<_>>().join(", ");
    q.sql = format!("SELECT {} FROM {}", cols, qualified);
    Ok(q.finish(StatementShape::ListKeys {
        table: table.clone(),
        key_columns: names(&keys),
    }))
}

/// SELECT all columns WHERE key matches, fetching at most [`GET_ONE_FETCH`] rows.
pub fn get_one(table: &TableRef, shape: &TableShape, key: &RecordKey) -> Result<Statement, AppError> {
    ensure_key_len(shape, key)?;
    let mut q = QueryBuf::new();
    let qualified = qualified_table(table)?;
    let columns = validated_columns(shape.columns.iter())?;
    let keys = validated_columns(shape.key_columns())?;
    let cols = columns.iter().map(|c| select_expr(c)).collect::<Vec<_>>().join(", ");
    let predicate = key_predicate(&mut q, &keys, key);
    q.sql = format!(
        "SELECT {} FROM {}{} LIMIT {}",
        cols,
        qualified,
        where_clause(&predicate),
        GET_ONE_FETCH
    );
    Ok(q.finish(StatementShape::GetOne {
        table: table.clone(),
        columns: names(&columns),
        key_columns: names(&keys),
    }))
}

/// INSERT all columns. `value` must carry exactly the full column set.
pub fn insert(table: &TableRef, shape: &TableShape, value: &RecordValue) -> Result<Statement, AppError> {
    ensure_full_column_set(shape, value)?;
    let mut q = QueryBuf::new();
    let qualified = qualified_table(table)?;
    let columns = validated_columns(shape.columns.iter())?;
    let mut cols = Vec::with_capacity(columns.len());
    let mut placeholders = Vec::with_capacity(columns.len());
    for c in &columns {
        let v = value.get(&c.name).cloned().unwrap_or(Value::Null);
        placeholders.push(q.push_param(c, v));
        cols.push(quoted(&c.name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified,
        cols.join(", "),
        placeholders.join(", ")
    );
    Ok(q.finish(StatementShape::Insert {
        table: table.clone(),
        columns: names(&columns),
    }))
}

/// UPDATE every column of at most one row located by `key`. Key columns may change.
pub fn update(
    table: &TableRef,
    shape: &TableShape,
    key: &RecordKey,
    value: &RecordValue,
) -> Result<Statement, AppError> {
    ensure_key_len(shape, key)?;
    ensure_full_column_set(shape, value)?;
    let mut q = QueryBuf::new();
    let qualified = qualified_table(table)?;
    let columns = validated_columns(shape.columns.iter())?;
    let keys = validated_columns(shape.key_columns())?;
    let mut sets = Vec::with_capacity(columns.len());
    for c in &columns {
        let v = value.get(&c.name).cloned().unwrap_or(Value::Null);
        let ph = q.push_param(c, v);
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    let predicate = key_predicate(&mut q, &keys, key);
    q.sql = format!(
        "UPDATE {} SET {}{}",
        qualified,
        sets.join(", "),
        single_row_target(&qualified, &predicate)
    );
    Ok(q.finish(StatementShape::Update {
        table: table.clone(),
        columns: names(&columns),
        key_columns: names(&keys),
    }))
}

/// DELETE at most one row located by `key`.
pub fn delete(table: &TableRef, shape: &TableShape, key: &RecordKey) -> Result<Statement, AppError> {
    ensure_key_len(shape, key)?;
    let mut q = QueryBuf::new();
    let qualified = qualified_table(table)?;
    let keys = validated_columns(shape.key_columns())?;
    let predicate = key_predicate(&mut q, &keys, key);
    q.sql = format!(
        "DELETE FROM {}{}",
        qualified,
        single_row_target(&qualified, &predicate)
    );
    Ok(q.finish(StatementShape::Delete {
        table: table.clone(),
        key_columns: names(&keys),
    }))
}
