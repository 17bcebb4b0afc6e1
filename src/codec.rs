//! Key codec: record keys to and from the single path segment that names a record.
//!
//! Key values are stringified and joined with [`DELIMITER`]. Decoding splits on every
//! delimiter, so a key value that itself contains `-` (including negative numbers) does
//! not survive the round trip: decoding then yields the wrong part count and fails with
//! `DataInvalid`, or splits the values at the wrong place when the counts happen to line up.

use crate::error::AppError;
use crate::record::{scalar_text, RecordKey};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

pub const DELIMITER: char = '-';

/// Opaque path identifier of one record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PathToken(String);

impl PathToken {
    pub fn new(token: impl Into<String>) -> Self {
        PathToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn encode(key: &RecordKey) -> PathToken {
    let parts: Vec<String> = key.values().iter().map(scalar_text).collect();
    PathToken(parts.join(&DELIMITER.to_string()))
}

/// Split `token` into exactly `key_len` string values.
pub fn decode(token: &PathToken, key_len: usize) -> Result<RecordKey, AppError> {
    if key_len == 0 {
        return if token.0.is_empty() {
            Ok(RecordKey::default())
        } else {
            Err(AppError::data_invalid(format!(
                "table has no key columns but record '{}' was given",
                token
            )))
        };
    }
    let parts: Vec<Value> = token
        .0
        .split(DELIMITER)
        .map(|p| Value::String(p.to_string()))
        .collect();
    if parts.len() != key_len {
        return Err(AppError::data_invalid(format!(
            "record '{}' has {} key parts, expected {}",
            token,
            parts.len(),
            key_len
        )));
    }
    Ok(RecordKey::new(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> RecordKey {
        RecordKey::new(values.iter().map(|v| json!(v)).collect())
    }

    #[test]
    fn round_trips_keys_without_delimiter() {
        for key in [strings(&["1"]), strings(&["eu", "42"]), strings(&["a", "b", "c_d"])] {
            let token = encode(&key);
            assert_eq!(decode(&token, key.len()).unwrap(), key);
        }
    }

    #[test]
    fn encoding_is_stable() {
        let key = RecordKey::new(vec![json!(1), json!("x"), json!(true)]);
        assert_eq!(encode(&key), encode(&key.clone()));
        assert_eq!(encode(&key).as_str(), "1-x-true");
    }

    #[test]
    fn numeric_keys_round_trip_in_text_form() {
        let key = RecordKey::new(vec![json!(1), json!(2.5)]);
        assert_eq!(decode(&encode(&key), 2).unwrap(), key);
        assert_eq!(key, strings(&["1", "2.5"]));
    }

    #[test]
    fn wrong_part_count_is_data_invalid() {
        let token = PathToken::new("1-2-3");
        assert!(matches!(decode(&token, 2), Err(AppError::DataInvalid(_))));
        assert!(matches!(decode(&token, 4), Err(AppError::DataInvalid(_))));
    }

    #[test]
    fn delimiter_inside_value_breaks_round_trip() {
        let key = strings(&["a-b"]);
        let token = encode(&key);
        assert!(matches!(decode(&token, 1), Err(AppError::DataInvalid(_))));

        let negative = RecordKey::new(vec![json!(-5)]);
        assert!(matches!(decode(&encode(&negative), 1), Err(AppError::DataInvalid(_))));
    }

    #[test]
    fn delimiter_inside_value_can_misalign_parts() {
        let key = strings(&["a-b", "c"]);
        let decoded = decode(&encode(&key), 3).unwrap();
        assert_eq!(decoded, strings(&["a", "b", "c"]));
        assert!(decode(&encode(&key), 2).is_err());
    }

    #[test]
    fn empty_key_shape_uses_empty_token() {
        assert_eq!(encode(&RecordKey::default()).as_str(), "");
        assert_eq!(decode(&PathToken::new(""), 0).unwrap(), RecordKey::default());
        assert!(decode(&PathToken::new("x"), 0).is_err());
    }
}
