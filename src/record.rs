//! Per-request record values: keys and full column maps.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Column name to scalar value. Create and update require exactly the table's full column set.
pub type RecordValue = HashMap<String, Value>;

/// Ordered key values, one per key column in key-shape order.
///
/// Values are held in their text form ([`scalar_text`]), the same form a decoded path
/// token carries, so a key built from a record equals the key decoded from its path.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordKey(Vec<Value>);

impl RecordKey {
    pub fn new(values: Vec<Value>) -> Self {
        RecordKey(values.iter().map(|v| Value::String(scalar_text(v))).collect())
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pull the key columns, in order, out of a full record value.
    pub fn from_record<'a>(key_columns: impl IntoIterator<Item = &'a str>, record: &RecordValue) -> Self {
        RecordKey::new(
            key_columns
                .into_iter()
                .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }
}

impl From<Vec<Value>> for RecordKey {
    fn from(values: Vec<Value>) -> Self {
        RecordKey::new(values)
    }
}

/// Text form of a scalar as it appears in paths and bound parameters.
pub fn scalar_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => v.to_string(),
    }
}
