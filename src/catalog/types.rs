//! Catalog facts: schema and table references, column descriptors, key shape.

use crate::error::AppError;
use crate::sql::validate_identifier;
use std::fmt;

/// One database/namespace. Always passes the identifier allow-list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaRef(String);

impl SchemaRef {
    pub fn parse(name: &str) -> Result<Self, AppError> {
        validate_identifier("database", name)?;
        Ok(SchemaRef(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: SchemaRef,
    pub name: String,
}

impl TableRef {
    pub fn parse(schema: &str, table: &str) -> Result<Self, AppError> {
        let schema = SchemaRef::parse(schema)?;
        validate_identifier("table", table)?;
        Ok(TableRef {
            schema,
            name: table.to_string(),
        })
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// 1-based position within the table.
    pub ordinal: u32,
    pub is_key: bool,
    /// Catalog type, used for parameter casts and result decoding.
    pub data_type: ColumnType,
}

/// Schema-qualified catalog type name (e.g. `pg_catalog.int4`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnType {
    pub schema: String,
    pub name: String,
}

impl ColumnType {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        ColumnType {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn builtin(name: &str) -> Self {
        ColumnType::new("pg_catalog", name)
    }

    /// Whether result values of this type are decoded by the driver without a text cast.
    pub fn decodes_natively(&self) -> bool {
        self.schema == "pg_catalog"
            && matches!(
                self.name.as_str(),
                "int2"
                    | "int4"
                    | "int8"
                    | "float4"
                    | "float8"
                    | "bool"
                    | "text"
                    | "varchar"
                    | "bpchar"
                    | "name"
                    | "json"
                    | "jsonb"
                    | "uuid"
                    | "timestamptz"
                    | "timestamp"
                    | "date"
            )
    }
}

/// Ordered column set of one table together with its key shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableShape {
    pub columns: Vec<ColumnDescriptor>,
}

impl TableShape {
    pub fn new(mut columns: Vec<ColumnDescriptor>) -> Self {
        columns.sort_by_key(|c| c.ordinal);
        TableShape { columns }
    }

    /// An unknown table has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_key)
    }

    pub fn key_shape(&self) -> Vec<String> {
        self.key_columns().map(|c| c.name.clone()).collect()
    }

    pub fn key_len(&self) -> usize {
        self.key_columns().count()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}
